//! Markdown rendering of extracted payloads

use serde_json::Value;

use crate::extract::is_truthy;

/// Pretty-printed JSON, used for raw results and unrecognised payloads
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Field value if present and truthy
fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| is_truthy(v))
}

/// Inline text of a JSON value: strings unquoted, arrays comma-joined
fn inline(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(inline).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn inline_or(value: &Value, key: &str, fallback: &str) -> String {
    field(value, key).map(inline).unwrap_or_else(|| fallback.to_string())
}

/// Render a lesson plan object as markdown
pub fn lesson_plan_markdown(plan: &Value) -> String {
    if !is_truthy(plan) {
        return pretty_json(plan);
    }

    let mut out = format!("# {}\n\n", inline_or(plan, "title", "Lesson Plan"));

    for (key, label) in [
        ("subject", "Subject"),
        ("grade", "Grade"),
        ("topic", "Topic"),
        ("duration", "Duration"),
    ] {
        if let Some(v) = field(plan, key) {
            out.push_str(&format!("**{}:** {}\n", label, inline(v)));
        }
    }
    if let Some(v) = field(plan, "language") {
        out.push_str(&format!("**Language:** {}\n\n", inline(v)));
    }

    if let Some(objectives) = field(plan, "objectives") {
        out.push_str("## Learning Objectives\n");
        match objectives.as_array() {
            Some(items) => {
                for (i, objective) in items.iter().enumerate() {
                    out.push_str(&format!("{}. {}\n", i + 1, inline(objective)));
                }
            }
            None => out.push_str(&format!("{}\n", inline(objectives))),
        }
        out.push('\n');
    }

    if let Some(activities) = field(plan, "activities") {
        out.push_str("## Activities\n");
        match activities.as_array() {
            Some(items) => {
                for (i, activity) in items.iter().enumerate() {
                    out.push_str(&format!("### Activity {}\n", i + 1));
                    if activity.is_object() {
                        for (key, label) in [
                            ("title", "Title"),
                            ("description", "Description"),
                            ("duration", "Duration"),
                            ("materials", "Materials"),
                        ] {
                            if let Some(v) = field(activity, key) {
                                out.push_str(&format!("**{}:** {}\n", label, inline(v)));
                            }
                        }
                    } else {
                        out.push_str(&format!("{}\n", inline(activity)));
                    }
                    out.push('\n');
                }
            }
            None => out.push_str(&format!("{}\n\n", inline(activities))),
        }
    }

    if let Some(assessment) = field(plan, "assessment") {
        out.push_str(&format!("## Assessment\n{}\n\n", inline(assessment)));
    }

    if let Some(resources) = field(plan, "resources") {
        out.push_str("## Resources\n");
        match resources.as_array() {
            Some(items) => {
                for resource in items {
                    out.push_str(&format!("• {}\n", inline(resource)));
                }
            }
            None => out.push_str(&format!("{}\n", inline(resources))),
        }
        out.push('\n');
    }

    out
}

/// Render a quiz object as markdown; anything without a `questions` array
/// is shown as JSON
pub fn quiz_markdown(quiz: &Value) -> String {
    let Some(questions) = quiz.get("questions").and_then(Value::as_array) else {
        return pretty_json(quiz);
    };

    let mut out = format!("# {}\n", inline_or(quiz, "title", "Quiz"));
    out.push_str(&format!("**Grade:** {}\n\n", inline_or(quiz, "grade", "N/A")));

    for (i, question) in questions.iter().enumerate() {
        out.push_str(&format!("## Question {}\n", i + 1));
        out.push_str(&format!(
            "**{}**\n\n",
            question.get("question_text").map(inline).unwrap_or_default()
        ));

        let kind = question.get("type").and_then(Value::as_str);
        let correct = question.get("correct_answer");
        let options = field(question, "options").and_then(Value::as_array);

        match (kind, options) {
            (Some("mcq"), Some(options)) => {
                for option in options {
                    out.push_str(&format!(
                        "{} {}. {}\n",
                        marker(option, correct),
                        option.get("id").map(inline).unwrap_or_default(),
                        option.get("text").map(inline).unwrap_or_default()
                    ));
                }
            }
            (Some("true_false"), Some(options)) => {
                for option in options {
                    out.push_str(&format!(
                        "{} {}\n",
                        marker(option, correct),
                        option.get("text").map(inline).unwrap_or_default()
                    ));
                }
            }
            (Some("fill_blank"), _) => {
                out.push_str(&format!(
                    "**Answer:** {}\n",
                    correct.map(inline).unwrap_or_default()
                ));
            }
            _ => {}
        }

        if let Some(explanation) = field(question, "explanation") {
            out.push_str(&format!("\n**Explanation:** {}\n", inline(explanation)));
        }

        out.push_str("\n---\n\n");
    }

    out
}

fn marker(option: &Value, correct: Option<&Value>) -> &'static str {
    if option.get("id") == correct {
        "✅"
    } else {
        "⚪"
    }
}
