//! UCI protocol lines: parsing engine output and formatting commands.

use std::time::Duration;

use chess_core::Evaluation;

/// A search progress line (`info depth ... score ... pv ...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: u32,
    /// 1-based MultiPV rank
    pub multipv: u32,
    /// Score from the side to move's point of view
    pub score: Option<Evaluation>,
    pub pv: Vec<String>,
}

/// Parse an `info` line. Lines without a depth and per-move
/// `currmove` reports yield None.
pub fn parse_info(line: &str) -> Option<InfoLine> {
    if !line.starts_with("info") || line.contains(" currmove ") {
        return None;
    }

    let depth: u32 = parse_field(line, "depth")?;
    let cp: Option<i32> = parse_field(line, "cp");
    let mate: Option<i32> = parse_field(line, "mate");
    let score = match (cp, mate) {
        (_, Some(mate)) => Some(Evaluation::Mate(mate)),
        (Some(cp), None) => Some(Evaluation::Centipawn(cp)),
        (None, None) => None,
    };

    Some(InfoLine {
        depth,
        multipv: parse_field(line, "multipv").unwrap_or(1),
        score,
        pv: parse_pv(line),
    })
}

/// The move in a `bestmove` line; None for `bestmove (none)`.
pub fn parse_bestmove(line: &str) -> Option<&str> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "bestmove" {
        return None;
    }
    parts.next().filter(|mv| *mv != "(none)")
}

/// Value following `key` on an info line
fn parse_field<T: std::str::FromStr>(line: &str, key: &str) -> Option<T> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == key && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut in_pv = false;
    let mut moves = Vec::new();

    for part in parts {
        if part == "pv" {
            in_pv = true;
            continue;
        }
        if in_pv {
            // PV ends at next keyword or end of line
            if part.starts_with("bmc") || part == "string" {
                break;
            }
            moves.push(part.to_string());
        }
    }

    moves
}

pub fn set_option(name: &str, value: impl std::fmt::Display) -> String {
    format!("setoption name {name} value {value}")
}

pub fn position_command(fen: &str, moves: &[String]) -> String {
    if moves.is_empty() {
        format!("position fen {fen}")
    } else {
        format!("position fen {fen} moves {}", moves.join(" "))
    }
}

pub fn go_command(depth: u32, time_limit: Option<Duration>) -> String {
    match time_limit {
        Some(limit) => format!("go depth {depth} movetime {}", limit.as_millis()),
        None => format!("go depth {depth}"),
    }
}
