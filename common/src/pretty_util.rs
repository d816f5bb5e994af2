use std::fmt::Debug;
use serde::Serialize;
use crate::config::load_style::Format;

/// Used by the CLI to echo parsed args / loaded config back to the operator
/// in whichever format they asked for.
pub fn to_string_pretty<T: Sized + Serialize + Debug>(f: &Format, val: &T) -> String {
    match f {
        Format::Json => {
            match serde_json::to_string_pretty(val) {
                Ok(v) => v,
                Err(_e) => format!("to_string_pretty Json error:{:?}", val),
            }
        },
        Format::Yaml => {
            match serde_yaml::to_string(val) {
                Ok(v) => v,
                Err(_e) => format!("to_string_pretty Yaml error:{:?}", val),
            }
        },
        Format::None => {
            format!("{:?}", val)
        }
    }
}
