use std::str::FromStr;

use thiserror::Error;

use crate::geometry::PreviewPoint;
use crate::viewport::ZoomDirection;

/// One step of a scripted crop session, e.g. `pan:40,-12` or `zoom:in@250,250`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Pan {
        dx: f64,
        dy: f64,
    },
    Zoom {
        direction: ZoomDirection,
        anchor: Option<PreviewPoint>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GestureParseError {
    #[error("unknown gesture {input:?}; expected pan:DX,DY or zoom:in|out[@X,Y]")]
    UnknownKind { input: String },
    #[error("invalid coordinates {input:?}; expected two numbers separated by a comma")]
    InvalidPair { input: String },
    #[error("invalid zoom direction {input:?}; expected in or out")]
    InvalidDirection { input: String },
}

impl FromStr for ZoomDirection {
    type Err = GestureParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in" | "+" => Ok(Self::In),
            "out" | "-" => Ok(Self::Out),
            _ => Err(GestureParseError::InvalidDirection {
                input: value.to_string(),
            }),
        }
    }
}

fn parse_pair(value: &str) -> Result<(f64, f64), GestureParseError> {
    let invalid = || GestureParseError::InvalidPair {
        input: value.to_string(),
    };
    let (x, y) = value.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<f64>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f64>().map_err(|_| invalid())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(invalid());
    }
    Ok((x, y))
}

impl FromStr for Gesture {
    type Err = GestureParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let unknown = || GestureParseError::UnknownKind {
            input: value.to_string(),
        };
        let (kind, arguments) = value.trim().split_once(':').ok_or_else(unknown)?;

        match kind.trim().to_ascii_lowercase().as_str() {
            "pan" => {
                let (dx, dy) = parse_pair(arguments)?;
                Ok(Self::Pan { dx, dy })
            }
            "zoom" => {
                let (direction, anchor) = match arguments.split_once('@') {
                    Some((direction, anchor)) => {
                        let (x, y) = parse_pair(anchor)?;
                        (direction, Some(PreviewPoint::new(x, y)))
                    }
                    None => (arguments, None),
                };
                Ok(Self::Zoom {
                    direction: direction.parse()?,
                    anchor,
                })
            }
            _ => Err(unknown()),
        }
    }
}
