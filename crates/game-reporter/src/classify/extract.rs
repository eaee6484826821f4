//! Pulls the evaluation data the classifier needs out of a tree node.

use chess_core::engine_line::{sibling_line, top_line};
use chess_core::{EngineLine, Evaluation, GameTree, TreeNode};
use shakmaty::{Chess, Color, Move, Position};

use crate::board_utils::parse_uci_move;
use crate::error::AnalysisError;

/// A node's best line and, when available, its second-best line, resolved
/// against the node's position.
#[derive(Debug, Clone)]
pub struct ExtractedNode<'a> {
    pub position: &'a Chess,
    pub top_line: &'a EngineLine,
    pub top_move: Option<Move>,
    pub evaluation: Evaluation,
    pub subjective_evaluation: Evaluation,
    /// The move that led to this node, resolved on the parent's position
    pub played_move: Option<Move>,
    pub second_top_line: Option<&'a EngineLine>,
    pub second_top_move: Option<Move>,
    pub second_subjective_evaluation: Option<Evaluation>,
}

fn extract<'a>(tree: &'a GameTree, node: &'a TreeNode) -> Result<ExtractedNode<'a>, AnalysisError> {
    let position = &node.state.position;
    let top_line = top_line(&node.state.engine_lines).ok_or_else(|| {
        AnalysisError::MissingEvaluationData(format!("no top line for node {}", node.id))
    })?;

    let top_move = top_line
        .first_move()
        .and_then(|mv| parse_uci_move(position, &mv.uci));

    let played_move = match (&node.state.played, tree.parent_of(node.id)) {
        (Some(played), Some(parent)) => parse_uci_move(&parent.state.position, &played.uci),
        _ => None,
    };

    let colour = node.state.move_colour.unwrap_or(Color::White);

    let second_top_line = sibling_line(&node.state.engine_lines, top_line, 2);
    let second_top_move = second_top_line
        .and_then(EngineLine::first_move)
        .and_then(|mv| parse_uci_move(position, &mv.uci));
    // The second move is made by the side to move here
    let second_subjective_evaluation = second_top_move
        .as_ref()
        .zip(second_top_line)
        .map(|(_, line)| line.evaluation.subjective(position.turn()));

    Ok(ExtractedNode {
        position,
        top_line,
        top_move,
        evaluation: top_line.evaluation,
        subjective_evaluation: top_line.evaluation.subjective(colour),
        played_move,
        second_top_line,
        second_top_move,
        second_subjective_evaluation,
    })
}

/// The position before the move. Requires a best line with a legal first move.
pub fn extract_previous<'a>(
    tree: &'a GameTree,
    node: &'a TreeNode,
) -> Result<ExtractedNode<'a>, AnalysisError> {
    let extracted = extract(tree, node)?;
    if extracted.top_move.is_none() {
        return Err(AnalysisError::MissingEvaluationData(format!(
            "top line of node {} has no playable first move",
            node.id
        )));
    }
    Ok(extracted)
}

/// The position after the move. Requires a parent, a best line and a
/// resolvable played move.
pub fn extract_current<'a>(
    tree: &'a GameTree,
    node: &'a TreeNode,
) -> Result<ExtractedNode<'a>, AnalysisError> {
    if node.parent().is_none() {
        return Err(AnalysisError::AnalysisPrecondition("root node has no played move"));
    }
    let extracted = extract(tree, node)?;
    if extracted.played_move.is_none() {
        return Err(AnalysisError::MissingEvaluationData(format!(
            "played move of node {} could not be resolved",
            node.id
        )));
    }
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::LineMove;

    fn line(index: u32, cp: i32, uci: &str) -> EngineLine {
        EngineLine {
            source: "test".to_string(),
            depth: 20,
            index,
            evaluation: Evaluation::Centipawn(cp),
            moves: vec![LineMove {
                uci: uci.to_string(),
                san: uci.to_string(),
            }],
        }
    }

    #[test]
    fn test_extract_previous_with_second_line() {
        let mut tree = GameTree::default();
        let root = tree.root();
        tree.node_mut(root).unwrap().state.engine_lines =
            vec![line(1, 30, "e2e4"), line(2, 20, "d2d4")];

        let node = tree.node(root).unwrap();
        let previous = extract_previous(&tree, node).unwrap();
        assert_eq!(previous.evaluation, Evaluation::Centipawn(30));
        assert!(previous.top_move.is_some());
        assert!(previous.played_move.is_none());
        assert_eq!(previous.second_subjective_evaluation, Some(Evaluation::Centipawn(20)));
    }

    #[test]
    fn test_extract_current_subjective_for_black() {
        let mut tree = GameTree::from_san_moves(&["e4", "e5"]).unwrap();
        let last = *tree.mainline().last().unwrap();
        tree.node_mut(last).unwrap().state.engine_lines = vec![line(1, 40, "g1f3")];

        let node = tree.node(last).unwrap();
        let current = extract_current(&tree, node).unwrap();
        assert_eq!(current.subjective_evaluation, Evaluation::Centipawn(-40));
        assert_eq!(current.played_move.unwrap().to().to_string(), "e5");
        assert!(current.second_top_line.is_none());
    }

    #[test]
    fn test_missing_lines() {
        let tree = GameTree::from_san_moves(&["e4"]).unwrap();
        let last = tree.node(*tree.mainline().last().unwrap()).unwrap();
        assert!(matches!(
            extract_current(&tree, last),
            Err(AnalysisError::MissingEvaluationData(_))
        ));

        let root = tree.node(tree.root()).unwrap();
        assert!(matches!(
            extract_current(&tree, root),
            Err(AnalysisError::AnalysisPrecondition(_))
        ));
    }

    #[test]
    fn test_unplayable_top_move() {
        let mut tree = GameTree::default();
        let root = tree.root();
        tree.node_mut(root).unwrap().state.engine_lines = vec![line(1, 30, "e2e5")];
        let node = tree.node(root).unwrap();
        assert!(extract_previous(&tree, node).is_err());
    }
}
