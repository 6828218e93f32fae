use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sahayak::{
    AgentClient, AgentConfig, Flow, FlowSession, LessonPlanRequest, PlanDuration, QuizRequest,
};

#[derive(Parser, Debug)]
#[command(name = "sahayak", author, version, about = "Generate lesson plans and quizzes with the Sahayak agents")]
pub struct Cli {
    /// Agent backend URL (overrides SAHAYAK_APP_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// User id for new sessions (overrides SAHAYAK_USER_ID)
    #[arg(long, global = true)]
    pub user_id: Option<String>,

    /// YAML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the extracted result as JSON instead of markdown
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a lesson plan
    LessonPlan {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        grade: String,
        #[arg(long)]
        topic: String,
        #[arg(long, default_value = "English")]
        language: String,
        #[arg(long, default_value = "daily")]
        duration: PlanDuration,
        #[arg(long, default_value = "")]
        requirements: String,
    },
    /// Generate a quiz
    Quiz {
        #[arg(long)]
        title: String,
        #[arg(long)]
        grade: String,
        #[arg(long)]
        requirements: String,
    },
}

impl Command {
    /// Validated flow and prompt for this command
    fn prompt(&self) -> Result<(Flow, String)> {
        match self {
            Command::LessonPlan {
                subject,
                grade,
                topic,
                language,
                duration,
                requirements,
            } => {
                let request = LessonPlanRequest {
                    language: language.clone(),
                    duration: *duration,
                    special_requirements: requirements.clone(),
                    ..LessonPlanRequest::new(subject.as_str(), grade.as_str(), topic.as_str())
                };
                request.validate()?;
                Ok((Flow::LessonPlanner, request.to_prompt()))
            }
            Command::Quiz {
                title,
                grade,
                requirements,
            } => {
                let request = QuizRequest::new(title.as_str(), grade.as_str(), requirements.as_str());
                request.validate()?;
                Ok((Flow::QuizGenerator, request.to_prompt()))
            }
        }
    }
}

/// Defaults → config file → environment → flags
pub fn load_config(cli: &Cli) -> Result<AgentConfig> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();

    let config = match &cli.config {
        Some(path) => AgentConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AgentConfig::default(),
    };
    let mut config = config.with_env_overrides();

    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url.as_str());
    }
    if let Some(user_id) = &cli.user_id {
        config = config.with_user_id(user_id.as_str());
    }
    Ok(config)
}

pub async fn run(cli: Cli) -> Result<()> {
    let (flow, prompt) = cli.command.prompt()?;
    let config = load_config(&cli)?;
    tracing::debug!(base_url = %config.base_url, %flow, "starting submission");

    let client = AgentClient::new(config)?;
    let mut session = FlowSession::new(client, flow);
    let submission = session
        .submit(&prompt)
        .await
        .with_context(|| format!("failed to generate {}", flow.payload_label().replace('_', " ")))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&submission.extracted)?);
    } else {
        println!("{}", flow.render(&submission.extracted));
    }
    Ok(())
}
