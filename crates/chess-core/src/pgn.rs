//! PGN parsing: a lightweight regex-based reader that builds a [`GameTree`],
//! keeping variations as alternative children.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::TreeError;
use crate::game_data::{Game, GameMetadata};
use crate::tree::{GameTree, NodeId};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("header regex"));

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{[^}]*\}|;[^\n]*|\$\d+|\(|\)|\d+\.+|1-0|0-1|1/2-1/2|\*|[^\s(){};$]+")
        .expect("movetext regex")
});

/// Parse a single-game PGN into its metadata and move tree.
pub fn parse_pgn(pgn: &str) -> Result<Game, TreeError> {
    let mut metadata = GameMetadata {
        white: "Unknown".to_string(),
        black: "Unknown".to_string(),
        result: "*".to_string(),
        ..Default::default()
    };

    for cap in HEADER_RE.captures_iter(pgn) {
        let value = cap[2].to_string();
        match &cap[1] {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Result" => metadata.result = value,
            "Date" => metadata.date = Some(value),
            "Event" => metadata.event = Some(value),
            "TimeControl" => metadata.time_control = Some(value),
            "ECO" => metadata.eco = Some(value),
            "WhiteElo" => metadata.white_elo = value.parse().ok(),
            "BlackElo" => metadata.black_elo = value.parse().ok(),
            "FEN" => metadata.fen = Some(value),
            _ => {}
        }
    }

    // A FEN header is honoured with or without SetUp
    let mut tree = match &metadata.fen {
        Some(fen) => GameTree::from_fen(fen)?,
        None => GameTree::default(),
    };

    let movetext = HEADER_RE.replace_all(pgn, "");
    read_movetext(&mut tree, &movetext)?;

    Ok(Game { metadata, tree })
}

/// Apply PGN movetext to `tree`, starting at its root.
pub fn read_movetext(tree: &mut GameTree, movetext: &str) -> Result<(), TreeError> {
    let mut current = tree.root();
    let mut variations: Vec<NodeId> = Vec::new();

    for token in TOKEN_RE.find_iter(movetext).map(|m| m.as_str()) {
        match token {
            "(" => {
                let branch_point = tree
                    .node(current)?
                    .parent()
                    .ok_or_else(|| TreeError::InvalidPgn("variation before any move".into()))?;
                variations.push(current);
                current = branch_point;
            }
            ")" => {
                current = variations
                    .pop()
                    .ok_or_else(|| TreeError::InvalidPgn("unbalanced ')'".into()))?;
            }
            "1-0" | "0-1" | "1/2-1/2" | "*" => {}
            t if t.starts_with('{') || t.starts_with(';') || t.starts_with('$') => {}
            t if t.ends_with('.') && t.starts_with(|c: char| c.is_ascii_digit()) => {}
            san => {
                let san = san.trim_end_matches(['!', '?']).replace('0', "O");
                current = tree.add_san(current, &san)?;
            }
        }
    }

    if !variations.is_empty() {
        return Err(TreeError::InvalidPgn("unterminated variation".into()));
    }
    Ok(())
}
