//! Scan-axis direction expressions.
//!
//! Panel `fs`/`ss` axes and rail directions are written as small algebraic
//! expressions over the lab axes, e.g. `+x`, `-0.5x +y` or `0.8y+0.6z`.
//! Coefficients on a repeated axis are summed, so `x+0.5x` gives `1.5x`.

use nalgebra::Vector3;

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum DirectionError {
    #[error("empty direction expression")]
    Empty,
    #[error("invalid character '{0}' in direction expression")]
    InvalidCharacter(char),
    #[error("term '{0}' does not end in x, y or z")]
    MissingAxis(String),
    #[error("invalid coefficient '{0}'")]
    BadCoefficient(String),
}

/// Evaluate a direction expression into lab-frame axis coefficients.
pub fn dir_conv(expr: &str) -> Result<Vector3<f64>, DirectionError> {
    let mut terms: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in expr.chars() {
        if ch.is_whitespace() {
            continue;
        }
        match ch {
            '+' | '-' => {
                if !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
                current.push(ch);
            }
            '0'..='9' | '.' | 'x' | 'y' | 'z' => {
                // Implicit leading '+' if the expression starts unsigned.
                if current.is_empty() {
                    current.push('+');
                }
                current.push(ch);
            }
            other => return Err(DirectionError::InvalidCharacter(other)),
        }
    }
    if !current.is_empty() {
        terms.push(current);
    }
    if terms.is_empty() {
        return Err(DirectionError::Empty);
    }

    let mut dir = Vector3::zeros();
    for term in terms {
        let (prefix, axis) = term.split_at(term.len() - 1);
        let component = match axis {
            "x" => &mut dir.x,
            "y" => &mut dir.y,
            "z" => &mut dir.z,
            _ => return Err(DirectionError::MissingAxis(term.clone())),
        };
        let coefficient = match prefix {
            "+" => 1.0,
            "-" => -1.0,
            _ => prefix
                .parse::<f64>()
                .map_err(|_| DirectionError::BadCoefficient(prefix.to_string()))?,
        };
        *component += coefficient;
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unit_axes() {
        assert_eq!(dir_conv("+x").unwrap(), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(dir_conv("y").unwrap(), Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(dir_conv("-z").unwrap(), Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn signed_coefficients() {
        let d = dir_conv("-0.5x+2y").unwrap();
        assert_relative_eq!(d.x, -0.5);
        assert_relative_eq!(d.y, 2.0);
        assert_relative_eq!(d.z, 0.0);
    }

    #[test]
    fn whitespace_between_terms_is_ignored() {
        let d = dir_conv("+0.5x -y").unwrap();
        assert_relative_eq!(d.x, 0.5);
        assert_relative_eq!(d.y, -1.0);
    }

    #[test]
    fn repeated_axes_are_summed() {
        let d = dir_conv("x+0.5x").unwrap();
        assert_relative_eq!(d.x, 1.5);
    }

    #[test]
    fn invalid_character_rejected() {
        assert_eq!(dir_conv("qx"), Err(DirectionError::InvalidCharacter('q')));
    }

    #[test]
    fn term_without_axis_rejected() {
        assert_eq!(
            dir_conv("0.5"),
            Err(DirectionError::MissingAxis("+0.5".into()))
        );
    }

    #[test]
    fn malformed_coefficient_rejected() {
        assert_eq!(
            dir_conv("1.2.3x"),
            Err(DirectionError::BadCoefficient("+1.2.3".into()))
        );
    }

    #[test]
    fn empty_expression_rejected() {
        assert_eq!(dir_conv(""), Err(DirectionError::Empty));
        assert_eq!(dir_conv("  "), Err(DirectionError::Empty));
    }
}
