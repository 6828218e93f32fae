//! Prompt composition for the portal forms
//!
//! Each request validates its fields and produces the single user message
//! sent to the agent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AgentError, AgentResult};

/// Lesson plan span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanDuration {
    #[default]
    Daily,
    Weekly,
}

impl fmt::Display for PlanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
        }
    }
}

impl FromStr for PlanDuration {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(AgentError::InvalidInput(format!(
                "unknown duration '{}', expected daily or weekly",
                other
            ))),
        }
    }
}

fn default_language() -> String {
    "English".to_string()
}

/// Lesson planner form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonPlanRequest {
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub duration: PlanDuration,
    #[serde(default)]
    pub special_requirements: String,
}

impl LessonPlanRequest {
    pub fn new(
        subject: impl Into<String>,
        grade_level: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            grade_level: grade_level.into(),
            topic: topic.into(),
            language: default_language(),
            duration: PlanDuration::Daily,
            special_requirements: String::new(),
        }
    }

    /// Subject, grade level and topic are required
    pub fn validate(&self) -> AgentResult<()> {
        let missing: Vec<&str> = [
            ("subject", &self.subject),
            ("grade level", &self.grade_level),
            ("topic", &self.topic),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AgentError::InvalidInput(format!(
                "please fill in {}",
                missing.join(", ")
            )))
        }
    }

    pub fn to_prompt(&self) -> String {
        let mut prompt = format!("Create a {} lesson plan for ", self.duration);

        if !self.grade_level.is_empty() {
            prompt.push_str(&self.grade_level);
            prompt.push(' ');
        }
        prompt.push_str(&self.subject);

        if !self.topic.is_empty() {
            prompt.push_str(&format!(" on '{}'", self.topic));
        }
        if !self.language.is_empty() && self.language != "English" {
            prompt.push_str(&format!(" in {}", self.language));
        }
        if !self.special_requirements.is_empty() {
            prompt.push_str(&format!(
                ". Special requirements: {}",
                self.special_requirements
            ));
        }

        prompt
    }
}

/// Quiz generator form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequest {
    pub title: String,
    pub grade_level: String,
    pub requirements: String,
}

impl QuizRequest {
    pub fn new(
        title: impl Into<String>,
        grade_level: impl Into<String>,
        requirements: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            grade_level: grade_level.into(),
            requirements: requirements.into(),
        }
    }

    pub fn validate(&self) -> AgentResult<()> {
        if self.title.chars().count() < 5 {
            return Err(AgentError::InvalidInput(
                "quiz title must be at least 5 characters".to_string(),
            ));
        }
        if self.grade_level.is_empty() {
            return Err(AgentError::InvalidInput(
                "please enter a grade level".to_string(),
            ));
        }
        if self.requirements.chars().count() < 10 {
            return Err(AgentError::InvalidInput(
                "questions must be at least 10 characters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_prompt(&self) -> String {
        format!(
            "Need quiz topic is {}, grade is {}. Additional requirements: {}",
            self.title, self.grade_level, self.requirements
        )
    }
}
