use std::str::FromStr;

use crate::motion::{
    input::InputMode,
    motion_controller::{ControllerSettings, PhaseClearType},
    properties::PropertyMap,
};

use super::parser::{ConfigLine, ConfigLines, ConfigWriter};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Line {line}: {key} is only valid inside a layer")]
    OutsideLayer { line: usize, key: String },

    #[error("Line {line}: PROPERTY must follow a MOTION")]
    PropertyWithoutMotion { line: usize },

    #[error("Line {line}: BEGIN_LAYER before the previous layer ended")]
    NestedLayer { line: usize },

    #[error("Layer \"{0}\" is missing END_LAYER")]
    UnterminatedLayer(String),

    #[error("Line {line}: invalid value \"{value}\" for {key}")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionDef {
    /// Registry kind used to construct the motion.
    pub kind: String,
    pub name: String,
    pub properties: PropertyMap,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerDef {
    pub name: String,
    pub animator_layer: usize,
    pub ignore_override: bool,
    pub motions: Vec<MotionDef>,
}

impl From<&ConfigLine> for LayerDef {
    fn from(value: &ConfigLine) -> Self {
        // BEGIN_LAYER <NAME> <ANIMATOR LAYER>
        Self {
            name: value.string(0),
            animator_layer: value.param::<i32>(1).max(0) as usize,
            ignore_override: false,
            motions: Vec::default(),
        }
    }
}

/// Settings plus every layer and motion of a controller, as read from a definition file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControllerDefs {
    pub settings: ControllerSettings,
    pub layers: Vec<LayerDef>,
}

fn keyword<T: FromStr>(line: &ConfigLine, index: usize) -> Result<T, ConfigError> {
    let value = line.string(index);
    T::from_str(&value).map_err(|_| ConfigError::InvalidValue {
        line: line.line_number,
        key: line.key.clone(),
        value,
    })
}

impl ControllerDefs {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Self::try_from(ConfigLines::parse(text))
    }

    /// Write the definitions in the format [ControllerDefs::parse] reads.
    pub fn to_text(&self) -> String {
        let settings = &self.settings;
        let mut writer = ConfigWriter::default();

        writer.line("INPUT_MODE").bare(settings.input_mode);
        writer
            .line("TARGET_STOP_DISTANCE")
            .bare(settings.target_stop_distance);
        writer
            .line("FIXED_UPDATE_FPS")
            .bare(settings.fixed_update_fps);
        writer
            .line("PHASE_CLEAR_TYPE")
            .bare(settings.phase_clear)
            .bare(settings.phase_dwell_time);
        writer.line("TREND_DELAY").bare(settings.trend_delay);
        writer.line("DEAD_ZONE").bare(settings.dead_zone);
        writer.line("MAX_SPEED").bare(settings.max_speed);

        for layer in self.layers.iter() {
            writer
                .line("BEGIN_LAYER")
                .quoted(&layer.name)
                .bare(layer.animator_layer);
            if layer.ignore_override {
                writer.line("IGNORE_OVERRIDE");
            }

            for motion in layer.motions.iter() {
                writer
                    .line("MOTION")
                    .bare(&motion.kind)
                    .quoted(&motion.name);
                for (name, value) in motion.properties.iter() {
                    writer.line("PROPERTY").bare(name).quoted(value);
                }
            }

            writer.line("END_LAYER");
        }

        writer.finish()
    }
}

impl TryFrom<ConfigLines> for ControllerDefs {
    type Error = ConfigError;

    fn try_from(value: ConfigLines) -> Result<Self, Self::Error> {
        let mut defs = ControllerDefs::default();

        enum State {
            None,
            Layer(LayerDef),
        }
        let mut state = State::None;

        for line in value.into_iter() {
            match line.key.as_str() {
                "INPUT_MODE" => {
                    defs.settings.input_mode = keyword::<InputMode>(&line, 0)?;
                }

                "TARGET_STOP_DISTANCE" => {
                    defs.settings.target_stop_distance = line.param(0);
                }

                "FIXED_UPDATE_FPS" => {
                    defs.settings.fixed_update_fps = line.param(0);
                }

                "PHASE_CLEAR_TYPE" => {
                    // PHASE_CLEAR_TYPE <IMMEDIATE | DWELL> [<DWELL TIME>]
                    defs.settings.phase_clear = keyword::<PhaseClearType>(&line, 0)?;
                    if let Some(dwell) = line.maybe_param(1) {
                        defs.settings.phase_dwell_time = dwell;
                    }
                }

                "TREND_DELAY" => {
                    defs.settings.trend_delay = line.param(0);
                }

                "DEAD_ZONE" => {
                    defs.settings.dead_zone = line.param(0);
                }

                "MAX_SPEED" => {
                    defs.settings.max_speed = line.param(0);
                }

                "BEGIN_LAYER" => {
                    if matches!(state, State::Layer(_)) {
                        return Err(ConfigError::NestedLayer {
                            line: line.line_number,
                        });
                    }
                    state = State::Layer(LayerDef::from(&line));
                }

                "IGNORE_OVERRIDE" => match state {
                    State::Layer(ref mut layer) => layer.ignore_override = true,
                    State::None => {
                        return Err(ConfigError::OutsideLayer {
                            line: line.line_number,
                            key: line.key,
                        });
                    }
                },

                "MOTION" => match state {
                    // MOTION <KIND> <NAME>
                    State::Layer(ref mut layer) => layer.motions.push(MotionDef {
                        kind: line.string(0),
                        name: line.string(1),
                        properties: PropertyMap::default(),
                    }),
                    State::None => {
                        return Err(ConfigError::OutsideLayer {
                            line: line.line_number,
                            key: line.key,
                        });
                    }
                },

                "PROPERTY" => {
                    // PROPERTY <NAME> <VALUE>
                    let State::Layer(ref mut layer) = state else {
                        return Err(ConfigError::OutsideLayer {
                            line: line.line_number,
                            key: line.key,
                        });
                    };
                    let Some(motion) = layer.motions.last_mut() else {
                        return Err(ConfigError::PropertyWithoutMotion {
                            line: line.line_number,
                        });
                    };
                    motion.properties.insert(&line.string(0), line.text(1));
                }

                "END_LAYER" => {
                    let state = std::mem::replace(&mut state, State::None);
                    match state {
                        State::Layer(layer) => defs.layers.push(layer),
                        State::None => {
                            return Err(ConfigError::OutsideLayer {
                                line: line.line_number,
                                key: line.key,
                            });
                        }
                    }
                }

                _ => tracing::warn!("Invalid key for ControllerDefs: {}", line.key),
            }
        }

        if let State::Layer(layer) = state {
            return Err(ConfigError::UnterminatedLayer(layer.name));
        }

        Ok(defs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFS: &str = r#"
; Humanoid with an upper body layer.
INPUT_MODE TRACK_TRANSFORM
TARGET_STOP_DISTANCE 0.25
FIXED_UPDATE_FPS 30
PHASE_CLEAR_TYPE DWELL 0.15
TREND_DELAY 0.2
DEAD_ZONE 0.01
MAX_SPEED 6

BEGIN_LAYER "Base Layer" 0
MOTION Idle "Idle"
PROPERTY Priority "0"
MOTION Locomotion "Walk Run"
PROPERTY RunSpeed "5.5"
END_LAYER

BEGIN_LAYER "Upper Body" 1
IGNORE_OVERRIDE
MOTION Idle "Upper Idle"
END_LAYER
"#;

    #[test]
    fn parses_settings_and_layers() {
        let defs = ControllerDefs::parse(DEFS).unwrap();

        assert_eq!(defs.settings.input_mode, InputMode::TrackTransform);
        assert_eq!(defs.settings.target_stop_distance, 0.25);
        assert_eq!(defs.settings.fixed_update_fps, 30.0);
        assert_eq!(defs.settings.phase_clear, PhaseClearType::Dwell);
        assert_eq!(defs.settings.phase_dwell_time, 0.15);
        assert_eq!(defs.settings.dead_zone, 0.01);
        assert_eq!(defs.settings.max_speed, 6.0);

        assert_eq!(defs.layers.len(), 2);
        let base = &defs.layers[0];
        assert_eq!(base.name, "Base Layer");
        assert_eq!(base.animator_layer, 0);
        assert!(!base.ignore_override);
        assert_eq!(base.motions[1].kind, "Locomotion");
        assert_eq!(base.motions[1].name, "Walk Run");
        assert_eq!(base.motions[1].properties.get("RunSpeed"), Some("5.5"));

        let upper = &defs.layers[1];
        assert_eq!(upper.animator_layer, 1);
        assert!(upper.ignore_override);
    }

    #[test]
    fn text_round_trips() {
        let defs = ControllerDefs::parse(DEFS).unwrap();
        let reparsed = ControllerDefs::parse(&defs.to_text()).unwrap();
        assert_eq!(reparsed, defs);
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let defs = ControllerDefs::parse("CAMERA_SHAKE 1\nTREND_DELAY 0.5\n").unwrap();
        assert_eq!(defs.settings.trend_delay, 0.5);
        assert!(defs.layers.is_empty());
    }

    #[test]
    fn structural_errors_are_reported() {
        assert_eq!(
            ControllerDefs::parse("MOTION Idle \"Idle\""),
            Err(ConfigError::OutsideLayer {
                line: 1,
                key: "MOTION".into()
            })
        );
        assert_eq!(
            ControllerDefs::parse("BEGIN_LAYER \"A\" 0\nPROPERTY Priority \"1\""),
            Err(ConfigError::PropertyWithoutMotion { line: 2 })
        );
        assert_eq!(
            ControllerDefs::parse("BEGIN_LAYER \"A\" 0\nBEGIN_LAYER \"B\" 1"),
            Err(ConfigError::NestedLayer { line: 2 })
        );
        assert_eq!(
            ControllerDefs::parse("BEGIN_LAYER \"A\" 0\nMOTION Idle \"Idle\""),
            Err(ConfigError::UnterminatedLayer("A".into()))
        );
    }

    #[test]
    fn invalid_keywords_are_errors() {
        assert_eq!(
            ControllerDefs::parse("INPUT_MODE JOYSTICK"),
            Err(ConfigError::InvalidValue {
                line: 1,
                key: "INPUT_MODE".into(),
                value: "JOYSTICK".into(),
            })
        );
    }
}
