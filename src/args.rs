use bevy::prelude::*;
use clap::Parser;

use crate::animation::{ClipMapping, FallbackPolicy};
use crate::settings::RunnerSettings;

#[derive(Parser, Resource, Debug, Clone, PartialEq)]
#[command(name = "endless_runner", about = "Three-lane endless runner")]
pub struct Args {
    /// world scroll speed, units per second
    #[arg(long)]
    pub speed: Option<f32>,

    /// gravity while airborne
    #[arg(long)]
    pub gravity: Option<f32>,

    /// upward velocity of a jump
    #[arg(long)]
    pub jump_velocity: Option<f32>,

    /// seed for obstacle lanes; random if omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// CSS selector of the canvas to render into
    #[arg(long, default_value = "#runner-canvas")]
    pub canvas: String,

    /// refuse to guess animation clips by position
    #[arg(long, default_value_t = false)]
    pub strict_clips: bool,

    /// start with the tuning panel hidden (F1 toggles it)
    #[arg(long, default_value_t = false)]
    pub no_debug_panel: bool,
}

impl Default for Args {
    fn default() -> Self {
        Args::parse_from(["endless_runner"])
    }
}

impl Args {
    /// Turns `key,value` pairs from the page URL into flags.
    pub fn from_url_params(params: &[String]) -> Result<Self, clap::Error> {
        let mut argv = vec!["endless_runner".to_string()];
        for param in params {
            let Some((key, value)) = param.split_once(',') else {
                continue;
            };
            let flag = key.replace('_', "-");
            match value {
                "" | "true" => argv.push(format!("--{flag}")),
                "false" => {}
                _ => argv.push(format!("--{flag}={value}")),
            }
        }
        Args::try_parse_from(argv)
    }

    pub fn settings(&self) -> RunnerSettings {
        let mut settings = RunnerSettings::default();
        if let Some(speed) = self.speed {
            settings.world_speed = speed;
        }
        if let Some(gravity) = self.gravity {
            settings.gravity = gravity;
        }
        if let Some(jump_velocity) = self.jump_velocity {
            settings.jump_velocity = jump_velocity;
        }
        settings
    }

    pub fn clip_mapping(&self) -> ClipMapping {
        ClipMapping {
            fallback: if self.strict_clips {
                FallbackPolicy::Strict
            } else {
                FallbackPolicy::Positional
            },
            ..default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_params_map_onto_flags() {
        let params = vec![
            "speed,24".to_string(),
            "strict_clips,true".to_string(),
            "no_debug_panel,false".to_string(),
            "malformed".to_string(),
        ];
        let args = Args::from_url_params(&params).unwrap();
        assert_eq!(args.speed, Some(24.0));
        assert!(args.strict_clips);
        assert!(!args.no_debug_panel);
        assert_eq!(args.settings().world_speed, 24.0);
        assert_eq!(args.clip_mapping().fallback, FallbackPolicy::Strict);
    }

    #[test]
    fn unknown_url_param_is_an_error() {
        let params = vec!["room_url,ws://x".to_string()];
        assert!(Args::from_url_params(&params).is_err());
    }

    #[test]
    fn defaults_leave_settings_untouched() {
        let args = Args::default();
        assert_eq!(args.settings(), RunnerSettings::default());
        assert_eq!(args.canvas, "#runner-canvas");
    }
}
