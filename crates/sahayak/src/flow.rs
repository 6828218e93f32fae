//! Agent flows served over `run_sse`

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extract::{Extracted, ExtractionProfile};
use crate::render;

const LESSON_PLAN_PROFILE: ExtractionProfile = ExtractionProfile {
    envelope_key: "lesson_planner_agent_response",
    function_response_keys: &["lesson_plan", "title"],
};

const QUIZ_PROFILE: ExtractionProfile = ExtractionProfile {
    envelope_key: "quiz_generator_agent_response",
    function_response_keys: &["questions"],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    LessonPlanner,
    QuizGenerator,
}

impl Flow {
    /// Backend app name, used in the session path and request body
    pub fn app_name(&self) -> &'static str {
        match self {
            Self::LessonPlanner => "lesson_planner",
            Self::QuizGenerator => "quiz_generator",
        }
    }

    pub fn profile(&self) -> &'static ExtractionProfile {
        match self {
            Self::LessonPlanner => &LESSON_PLAN_PROFILE,
            Self::QuizGenerator => &QUIZ_PROFILE,
        }
    }

    /// Label of the structured variant
    pub fn payload_label(&self) -> &'static str {
        match self {
            Self::LessonPlanner => "lesson_plan",
            Self::QuizGenerator => "quiz",
        }
    }

    /// Markdown for structured payloads, pretty JSON for raw ones
    pub fn render(&self, extracted: &Extracted) -> String {
        match (self, extracted) {
            (Self::LessonPlanner, Extracted::Structured(plan)) => {
                render::lesson_plan_markdown(plan)
            }
            (Self::QuizGenerator, Extracted::Structured(quiz)) => render::quiz_markdown(quiz),
            (_, Extracted::Raw(data)) => render::pretty_json(data),
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.app_name())
    }
}
