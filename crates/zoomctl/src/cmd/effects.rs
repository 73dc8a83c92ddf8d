use serde::Serialize;
use zoomctl_control::{EffectInfo, KNOWN_EFFECTS};

use crate::cmd::EffectsArgs;
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::{new_table, print_json, OutputFormat};

#[derive(Serialize)]
struct EffectsOutput<'a> {
    schema_id: &'static str,
    effects: Vec<&'a EffectInfo>,
}

pub fn run(args: EffectsArgs, format: OutputFormat) -> CliResult<i32> {
    let effects = select(args.category.as_deref())?;

    match format {
        OutputFormat::Json => print_json(&EffectsOutput {
            schema_id: "zoomctl/cli/v1/effects",
            effects,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["NAME", "CODE", "CATEGORY"]);
            for e in effects {
                table.add_row(vec![
                    e.name.to_string(),
                    format!("{:#04x}", e.code),
                    e.category.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for e in effects {
                println!("{:#04x}  {:<11} {}", e.code, e.name, e.category);
            }
        }
        OutputFormat::Raw => {
            for e in effects {
                println!("{}", e.name);
            }
        }
    }
    Ok(SUCCESS)
}

fn select(category: Option<&str>) -> CliResult<Vec<&'static EffectInfo>> {
    let Some(category) = category else {
        return Ok(KNOWN_EFFECTS.iter().collect());
    };

    let effects: Vec<&EffectInfo> = KNOWN_EFFECTS
        .iter()
        .filter(|e| e.category.to_string().eq_ignore_ascii_case(category.trim()))
        .collect();
    if effects.is_empty() {
        return Err(CliError::new(
            USAGE,
            format!("unknown effect category: {category}"),
        ));
    }
    Ok(effects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_effects_by_default() {
        assert_eq!(select(None).unwrap().len(), KNOWN_EFFECTS.len());
    }

    #[test]
    fn filter_by_category() {
        let names: Vec<&str> = select(Some("Reverb"))
            .unwrap()
            .iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["HALL", "ROOM", "SPRING", "PLATE"]);
    }

    #[test]
    fn unknown_category() {
        let err = select(Some("cowbell")).unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
