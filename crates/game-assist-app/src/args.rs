//! Command-line options.

use std::path::PathBuf;

use game_assist_core::PromptType;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    /// Send `Start` once the overlay is up
    pub start: bool,
    /// Screenshot to analyze at launch
    pub upload: Option<PathBuf>,
    /// Headless: analyze this screenshot and exit
    pub analyze: Option<PathBuf>,
    /// Prompt override for this run
    pub prompt: Option<PromptType>,
    pub verbose: bool,
}

pub fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--start" => options.start = true,
            "--verbose" | "-v" => options.verbose = true,
            "--upload" => {
                i += 1;
                let path = args.get(i).ok_or("--upload requires a file")?;
                options.upload = Some(PathBuf::from(path));
            }
            "--analyze" => {
                i += 1;
                let path = args.get(i).ok_or("--analyze requires a file")?;
                options.analyze = Some(PathBuf::from(path));
            }
            "--prompt" => {
                i += 1;
                let name = args.get(i).ok_or("--prompt requires a name")?;
                options.prompt = Some(parse_prompt(name)?);
            }
            _ => return Err(format!("Unknown argument: {}", arg)),
        }
        i += 1;
    }

    if options.upload.is_some() && options.analyze.is_some() {
        return Err("--upload and --analyze cannot be combined".to_string());
    }

    Ok(options)
}

/// Parse a preset name. Custom prompts come from the config file only.
pub fn parse_prompt(name: &str) -> Result<PromptType, String> {
    match name.to_lowercase().as_str() {
        "default" => Ok(PromptType::Default),
        "laning" | "laning-phase" => Ok(PromptType::LaningPhase),
        "teamfight" | "team-fight" => Ok(PromptType::TeamFight),
        "items" | "itemization" => Ok(PromptType::Itemization),
        "late" | "late-game" => Ok(PromptType::LateGame),
        "custom" => Ok(PromptType::Custom),
        _ => Err(format!(
            "Unknown prompt: {} (expected default, laning, teamfight, items, late or custom)",
            name
        )),
    }
}
