//! The built-in research → writing content pipeline.

use crate::pipeline::Pipeline;
use crate::role::{Role, ToolBinding};
use crate::work_unit::WorkUnit;

/// Topic used when none is supplied.
pub const DEFAULT_TOPIC: &str = "Medical Industry Using Generative AI";

pub const RESEARCH_ANALYST: &str = "Senior Research Analyst";
pub const CONTENT_WRITER: &str = "Content Writer";

pub const RESEARCH_UNIT: &str = "research";
pub const WRITING_UNIT: &str = "writing";

pub fn research_analyst() -> Role {
    Role::new(
        RESEARCH_ANALYST,
        "Research and analyze {topic} from reliable sources.",
        "Expert in web research, fact-checking, and synthesizing insights.",
    )
    .with_delegation(true)
    .with_tool(ToolBinding::search())
}

pub fn content_writer() -> Role {
    Role::new(
        CONTENT_WRITER,
        "Convert research on {topic} into an engaging blog post.",
        "Skilled writer who simplifies technical content while keeping it factual.",
    )
    .with_delegation(true)
}

/// Research a topic, then turn the brief into a markdown blog post.
pub fn content_pipeline() -> Pipeline {
    let units = vec![
        WorkUnit::new(
            RESEARCH_UNIT,
            "Research {topic}, covering recent trends, expert opinions, and statistics. \
             Ensure sources are credible and well-organized.",
            "A structured research brief with key findings, verified facts, and citations.",
            RESEARCH_ANALYST,
        ),
        WorkUnit::new(
            WRITING_UNIT,
            "Write an engaging, accurate blog post on {topic}, using the research brief. \
             Maintain clarity and citations.",
            "A well-structured blog post with proper citations and markdown formatting.",
            CONTENT_WRITER,
        ),
    ];

    match Pipeline::new(vec![research_analyst(), content_writer()], units) {
        Ok(pipeline) => pipeline,
        Err(err) => unreachable!("built-in pipeline is well formed: {err}"),
    }
}
