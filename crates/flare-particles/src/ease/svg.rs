//! SVG path data to cubic bezier segments

use flare_core::{FlareError, Result};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "ease/svg_path.pest"]
struct SvgPathParser;

const TWO_THIRDS: f64 = 2.0 / 3.0;

/// One lexical item of path data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Token<'a> {
    Command(char),
    Number(&'a str),
}

impl Token<'_> {
    fn is_command(&self) -> bool {
        matches!(self, Token::Command(_))
    }
}

pub(crate) fn tokenize(data: &str) -> Result<Vec<Token<'_>>> {
    let pairs = SvgPathParser::parse(Rule::path, data)
        .map_err(|e| FlareError::EaseParse(e.to_string()))?;

    let mut tokens = Vec::new();
    for pair in pairs {
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::number => tokens.push(Token::Number(inner.as_str())),
                Rule::command => {
                    if let Some(c) = inner.as_str().chars().next() {
                        tokens.push(Token::Command(c));
                    }
                }
                _ => {}
            }
        }
    }
    Ok(tokens)
}

/// Parses a numeric token, flushing tiny magnitudes to zero.
pub(crate) fn parse_number(text: &str) -> f64 {
    let n = text.parse::<f64>().unwrap_or(f64::NAN);
    if n.abs() < 0.0001 {
        0.0
    } else {
        n
    }
}

/// Extracts every number in `data`, ignoring commands.
pub(crate) fn numbers(data: &str) -> Result<Vec<f64>> {
    Ok(tokenize(data)?
        .into_iter()
        .filter_map(|t| match t {
            Token::Number(s) => Some(parse_number(s)),
            Token::Command(_) => None,
        })
        .collect())
}

/// Converts path data into segments of `[x, y, (cp1x, cp1y, cp2x, cp2y, x, y)*]`.
///
/// Every drawing command is reduced to cubic beziers: lines become
/// beziers with control points at thirds, quadratics are raised to
/// cubics, and arcs are split into quarter-turn beziers.
pub(crate) fn string_to_raw_path(data: &str) -> Result<Vec<Vec<f64>>> {
    let tokens = tokenize(data)?;
    let malformed = || FlareError::EaseParse(format!("malformed path: {data}"));

    if tokens.len() < 2 || !tokens[0].is_command() || tokens[1].is_command() {
        return Err(malformed());
    }

    let text = |i: isize| token_text(&tokens, i);
    let num = |i: isize| parse_number(token_text(&tokens, i));

    let mut path: Vec<Vec<f64>> = Vec::new();
    let mut segment: Option<Vec<f64>> = None;
    // false when a segment was started implicitly by a leading curve command
    let mut segment_in_path = false;

    let (mut relative_x, mut relative_y) = (0.0_f64, 0.0_f64);
    let (mut start_x, mut start_y) = (0.0_f64, 0.0_f64);
    let mut command = 'M';
    let mut is_relative = false;

    let len = tokens.len() as isize;
    let mut i: isize = 0;
    while i < len {
        let prev_command = command;
        match tokens[i as usize] {
            Token::Command(c) => {
                command = c.to_ascii_uppercase();
                is_relative = c.is_ascii_lowercase();
            }
            Token::Number(_) => {
                if command == 'Z' {
                    return Err(malformed());
                }
                // repeated parameters reuse the previous command
                i -= 1;
            }
        }

        let mut x = num(i + 1);
        let mut y = num(i + 2);
        if is_relative {
            x += relative_x;
            y += relative_y;
        }
        if i == 0 {
            start_x = x;
            start_y = y;
        }

        if command == 'M' {
            if let Some(done) = segment.take() {
                if done.len() >= 8 && segment_in_path {
                    path.push(done);
                }
            }
            relative_x = x;
            start_x = x;
            relative_y = y;
            start_y = y;
            segment = Some(vec![x, y]);
            segment_in_path = true;
            i += 2;
            command = 'L';
        } else if command == 'C' {
            let seg = segment.get_or_insert_with(|| {
                segment_in_path = false;
                vec![0.0, 0.0]
            });
            if !is_relative {
                relative_x = 0.0;
                relative_y = 0.0;
            }
            let cp2x = relative_x + num(i + 3);
            let cp2y = relative_y + num(i + 4);
            relative_x += num(i + 5);
            relative_y += num(i + 6);
            seg.extend_from_slice(&[x, y, cp2x, cp2y, relative_x, relative_y]);
            i += 6;
        } else {
            let seg = segment.as_mut().ok_or_else(malformed)?;
            match command {
                'S' => {
                    let mut dif_x = relative_x;
                    let mut dif_y = relative_y;
                    if (prev_command == 'C' || prev_command == 'S') && seg.len() >= 4 {
                        dif_x += relative_x - seg[seg.len() - 4];
                        dif_y += relative_y - seg[seg.len() - 3];
                    }
                    if !is_relative {
                        relative_x = 0.0;
                        relative_y = 0.0;
                    }
                    relative_x += num(i + 3);
                    relative_y += num(i + 4);
                    seg.extend_from_slice(&[dif_x, dif_y, x, y, relative_x, relative_y]);
                    i += 4;
                }
                'Q' => {
                    let dif_x = relative_x + (x - relative_x) * TWO_THIRDS;
                    let dif_y = relative_y + (y - relative_y) * TWO_THIRDS;
                    if !is_relative {
                        relative_x = 0.0;
                        relative_y = 0.0;
                    }
                    relative_x += num(i + 3);
                    relative_y += num(i + 4);
                    seg.extend_from_slice(&[
                        dif_x,
                        dif_y,
                        relative_x + (x - relative_x) * TWO_THIRDS,
                        relative_y + (y - relative_y) * TWO_THIRDS,
                        relative_x,
                        relative_y,
                    ]);
                    i += 4;
                }
                'T' => {
                    if seg.len() < 4 {
                        return Err(malformed());
                    }
                    let dif_x = relative_x - seg[seg.len() - 4];
                    let dif_y = relative_y - seg[seg.len() - 3];
                    seg.extend_from_slice(&[
                        relative_x + dif_x,
                        relative_y + dif_y,
                        x + ((relative_x + dif_x * 1.5) - x) * TWO_THIRDS,
                        y + ((relative_y + dif_y * 1.5) - y) * TWO_THIRDS,
                        x,
                        y,
                    ]);
                    relative_x = x;
                    relative_y = y;
                    i += 2;
                }
                'H' => {
                    push_line(seg, relative_x, relative_y, x, relative_y);
                    relative_x = x;
                    i += 1;
                }
                'V' => {
                    // the single parameter is y, but it was offset like an x
                    let end_y = x + if is_relative {
                        relative_y - relative_x
                    } else {
                        0.0
                    };
                    push_line(seg, relative_x, relative_y, relative_x, end_y);
                    relative_y = end_y;
                    i += 1;
                }
                'L' | 'Z' => {
                    if command == 'Z' {
                        x = start_x;
                        y = start_y;
                    }
                    if command == 'L'
                        || (relative_x - x).abs() > 0.5
                        || (relative_y - y).abs() > 0.5
                    {
                        push_line(seg, relative_x, relative_y, x, y);
                        if command == 'L' {
                            i += 2;
                        }
                    }
                    relative_x = x;
                    relative_y = y;
                }
                'A' => {
                    let mut flag1 = text(i + 4);
                    let mut flag2 = text(i + 5);
                    let mut dif_x = text(i + 6);
                    let mut dif_y = text(i + 7);
                    let mut step = 7;
                    // flags may be merged with the following value, as in "a8 8 0 018 8"
                    if flag1.len() > 1 {
                        if flag1.len() < 3 {
                            dif_y = dif_x;
                            dif_x = flag2;
                            step -= 1;
                        } else {
                            dif_y = flag2;
                            dif_x = &flag1[2..];
                            step -= 2;
                        }
                        flag2 = &flag1[1..2];
                        flag1 = &flag1[0..1];
                    }
                    let end_x = if is_relative { relative_x } else { 0.0 } + parse_number(dif_x);
                    let end_y = if is_relative { relative_y } else { 0.0 } + parse_number(dif_y);
                    let arc = ArcParams {
                        rx: num(i + 1),
                        ry: num(i + 2),
                        angle: num(i + 3),
                        large_arc: parse_number(flag1) != 0.0,
                        sweep: parse_number(flag2) != 0.0,
                    };
                    if let Some(beziers) =
                        arc_to_segment(relative_x, relative_y, arc, end_x, end_y)
                    {
                        seg.extend_from_slice(&beziers);
                    }
                    i += step;
                    relative_x = seg[seg.len() - 2];
                    relative_y = seg[seg.len() - 1];
                }
                _ => return Err(malformed()),
            }
        }
        i += 1;
    }

    if let Some(last) = segment {
        if last.len() >= 6 && segment_in_path {
            path.push(last);
        }
    }
    Ok(path)
}

/// Text of the number token at `i`, or an empty string (parsed as NaN).
fn token_text<'a>(tokens: &[Token<'a>], i: isize) -> &'a str {
    match usize::try_from(i).ok().and_then(|i| tokens.get(i)) {
        Some(Token::Number(s)) => s,
        _ => "",
    }
}

fn push_line(segment: &mut Vec<f64>, sx: f64, sy: f64, ex: f64, ey: f64) {
    let dif_x = (ex - sx) / 3.0;
    let dif_y = (ey - sy) / 3.0;
    segment.extend_from_slice(&[sx + dif_x, sy + dif_y, ex - dif_x, ey - dif_y, ex, ey]);
}

struct ArcParams {
    rx: f64,
    ry: f64,
    angle: f64,
    large_arc: bool,
    sweep: bool,
}

/// Approximates an elliptical arc with up to four cubic beziers.
/// Returns `None` when the arc starts and ends at the same point.
fn arc_to_segment(last_x: f64, last_y: f64, arc: ArcParams, x: f64, y: f64) -> Option<Vec<f64>> {
    use std::f64::consts::PI;

    if last_x == x && last_y == y {
        return None;
    }
    let mut rx = arc.rx.abs();
    let mut ry = arc.ry.abs();
    let angle_rad = (arc.angle % 360.0).to_radians();
    let (sin_angle, cos_angle) = angle_rad.sin_cos();
    let two_pi = PI * 2.0;
    let dx2 = (last_x - x) / 2.0;
    let dy2 = (last_y - y) / 2.0;
    let x1 = cos_angle * dx2 + sin_angle * dy2;
    let y1 = -sin_angle * dx2 + cos_angle * dy2;
    let x1_sq = x1 * x1;
    let y1_sq = y1 * y1;
    let radii_check = x1_sq / (rx * rx) + y1_sq / (ry * ry);
    if radii_check > 1.0 {
        rx *= radii_check.sqrt();
        ry *= radii_check.sqrt();
    }
    let rx_sq = rx * rx;
    let ry_sq = ry * ry;
    let mut sq = ((rx_sq * ry_sq) - (rx_sq * y1_sq) - (ry_sq * x1_sq))
        / ((rx_sq * y1_sq) + (ry_sq * x1_sq));
    if sq < 0.0 {
        sq = 0.0;
    }
    let coef = if arc.large_arc == arc.sweep { -1.0 } else { 1.0 } * sq.sqrt();
    let cx1 = coef * ((rx * y1) / ry);
    let cy1 = coef * -((ry * x1) / rx);
    let sx2 = (last_x + x) / 2.0;
    let sy2 = (last_y + y) / 2.0;
    let cx = sx2 + (cos_angle * cx1 - sin_angle * cy1);
    let cy = sy2 + (sin_angle * cx1 + cos_angle * cy1);
    let ux = (x1 - cx1) / rx;
    let uy = (y1 - cy1) / ry;
    let vx = (-x1 - cx1) / rx;
    let vy = (-y1 - cy1) / ry;
    let temp = ux * ux + uy * uy;
    let mut angle_start = if uy < 0.0 { -1.0 } else { 1.0 } * (ux / temp.sqrt()).acos();
    let mut angle_extent = if ux * vy - uy * vx < 0.0 { -1.0 } else { 1.0 }
        * ((ux * vx + uy * vy) / (temp * (vx * vx + vy * vy)).sqrt()).acos();
    if angle_extent.is_nan() {
        angle_extent = PI;
    }
    if !arc.sweep && angle_extent > 0.0 {
        angle_extent -= two_pi;
    } else if arc.sweep && angle_extent < 0.0 {
        angle_extent += two_pi;
    }
    angle_start %= two_pi;
    angle_extent %= two_pi;

    let segments = (angle_extent.abs() / (two_pi / 4.0)).ceil().max(1.0) as usize;
    let increment = angle_extent / segments as f64;
    let control_length = 4.0 / 3.0 * (increment / 2.0).sin() / (1.0 + (increment / 2.0).cos());
    let ma = cos_angle * rx;
    let mb = sin_angle * rx;
    let mc = sin_angle * -ry;
    let md = cos_angle * ry;

    let mut raw = Vec::with_capacity(segments * 6);
    for s in 0..segments {
        let a = angle_start + s as f64 * increment;
        let (y1, x1) = a.sin_cos();
        let (uy, ux) = (a + increment).sin_cos();
        raw.extend_from_slice(&[
            x1 - control_length * y1,
            y1 + control_length * x1,
            ux + control_length * uy,
            uy - control_length * ux,
            ux,
            uy,
        ]);
    }
    // scale the unit-circle beziers onto the actual ellipse
    for pair in raw.chunks_exact_mut(2) {
        let (px, py) = (pair[0], pair[1]);
        pair[0] = px * ma + py * mc + cx;
        pair[1] = px * mb + py * md + cy;
    }
    let n = raw.len();
    raw[n - 2] = x;
    raw[n - 1] = y;
    Some(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_mixed_separators() {
        let tokens = tokenize("M0,0 C0.5-1 .5.5,1 1").unwrap();
        assert_eq!(tokens[0], Token::Command('M'));
        assert_eq!(tokens[3], Token::Command('C'));
        assert_eq!(tokens[4], Token::Number("0.5"));
        assert_eq!(tokens[5], Token::Number("-1"));
        assert_eq!(tokens[6], Token::Number(".5"));
        assert_eq!(tokens[7], Token::Number(".5"));
    }

    #[test]
    fn numbers_flush_tiny_values() {
        let values = numbers("0, 1e-8, 0.5").unwrap();
        assert_eq!(values, vec![0.0, 0.0, 0.5]);
    }

    #[test]
    fn cubic_path_passes_through() {
        let path = string_to_raw_path("M0,0 C0.25,0.1 0.25,1 1,1").unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0], vec![0.0, 0.0, 0.25, 0.1, 0.25, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn line_becomes_bezier_at_thirds() {
        let path = string_to_raw_path("M0,0 L3,3").unwrap();
        assert_eq!(path[0], vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn relative_commands_accumulate() {
        let path = string_to_raw_path("m1,1 h3 v3").unwrap();
        let seg = &path[0];
        assert_eq!(&seg[0..2], &[1.0, 1.0]);
        assert_eq!(&seg[6..8], &[4.0, 1.0]);
        assert_eq!(&seg[12..14], &[4.0, 4.0]);
    }

    #[test]
    fn arc_ends_exactly_at_target() {
        let path = string_to_raw_path("M0,0 A5,5 0 0,1 10,0").unwrap();
        let seg = &path[0];
        assert!(seg.len() >= 8);
        assert_eq!(seg[seg.len() - 2], 10.0);
        assert_eq!(seg[seg.len() - 1], 0.0);
    }

    #[test]
    fn malformed_path_is_error() {
        assert!(string_to_raw_path("0 0 1 1").is_err());
        assert!(string_to_raw_path("M").is_err());
    }
}
