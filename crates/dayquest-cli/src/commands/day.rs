//! Day completion and per-day action data.

use clap::Subcommand;
use dayquest_core::challenge::ActionData;

use super::{open_engine, print_json, CommandResult};

#[derive(Subcommand)]
pub enum DayAction {
    /// Mark a day completed and award its XP
    Complete {
        /// Challenge day index (1-based)
        day: u32,
    },
    /// Clear a day's completion flag
    Uncomplete {
        /// Challenge day index (1-based)
        day: u32,
    },
    /// Print a day record
    Show {
        /// Challenge day index (1-based)
        day: u32,
    },
    /// Print or patch a day's action data
    Data {
        /// Challenge day index (1-based)
        day: u32,
        /// Field to merge as key=value; value is parsed as JSON, `null` removes
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
}

fn parse_fields(pairs: &[String]) -> Result<ActionData, Box<dyn std::error::Error>> {
    let mut patch = ActionData::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got '{pair}'"))?;
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        patch.insert(key.to_string(), value);
    }
    Ok(patch)
}

pub async fn run(action: DayAction) -> CommandResult {
    let mut engine = open_engine()?;

    match action {
        DayAction::Complete { day } => {
            let report = engine.complete_day(day).await?;
            print_json(&report.to_json())?;
        }
        DayAction::Uncomplete { day } => {
            let changed = engine.uncomplete_day(day)?;
            print_json(&serde_json::json!({ "day": day, "changed": changed }))?;
        }
        DayAction::Show { day } => {
            engine.store().check_day(day)?;
            match engine.store_mut().day(day)? {
                Some(record) => print_json(&record)?,
                None => print_json(&serde_json::json!({ "day": day, "completed": false }))?,
            }
        }
        DayAction::Data { day, set } => {
            if set.is_empty() {
                let data = engine.store_mut().get_day_action_data(day)?;
                print_json(&data.unwrap_or_default())?;
            } else {
                let patch = parse_fields(&set)?;
                let data = engine
                    .store_mut()
                    .upsert_day_action_data(day, |prev| {
                        dayquest_core::challenge::merge_action_fields(prev, patch)
                    })?;
                print_json(&data)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_parse_as_json_with_string_fallback() {
        let patch = parse_fields(&[
            "count=3".to_string(),
            "title=read a book".to_string(),
            "photo=null".to_string(),
        ])
        .unwrap();
        assert_eq!(patch["count"], 3);
        assert_eq!(patch["title"], "read a book");
        assert!(patch["photo"].is_null());
    }

    #[test]
    fn fields_require_equals_sign() {
        assert!(parse_fields(&["oops".to_string()]).is_err());
    }
}
