//! Move classification.
//!
//! Decision order for a non-root node: Forced, Theory, checkmate, then Best
//! or a point-loss label, then the Critical and Brilliant upgrades which only
//! ever apply on top of Best.

pub mod brilliant;
pub mod critical;
pub mod extract;
pub mod point_loss;

use chess_core::{Classification, GameTree, NodeId};
use shakmaty::Position;

use crate::config::AnalysisOptions;
use crate::error::AnalysisError;
use crate::openings::OpeningBook;

pub use brilliant::consider_brilliant;
pub use critical::{consider_critical, is_move_critical_candidate};
pub use extract::{extract_current, extract_previous, ExtractedNode};
pub use point_loss::point_loss_classify;

pub fn classify(
    tree: &GameTree,
    id: NodeId,
    options: &AnalysisOptions,
    book: &OpeningBook,
) -> Result<Classification, AnalysisError> {
    let node = tree.node(id)?;
    let parent = tree
        .parent_of(id)
        .ok_or(AnalysisError::AnalysisPrecondition("cannot classify a node without a parent"))?;

    if parent.state.position.legal_moves().len() <= 1 {
        return Ok(Classification::Forced);
    }

    if options.include_theory && book.name_for(&node.state.position).is_some() {
        return Ok(Classification::Theory);
    }

    if node.state.position.is_checkmate() {
        return Ok(Classification::Best);
    }

    let previous = extract_previous(tree, parent)?;
    let current = extract_current(tree, node)?;
    let Some(played) = current.played_move.clone() else {
        return Err(AnalysisError::MissingEvaluationData(format!(
            "no played move for node {id}"
        )));
    };
    let mover = node
        .state
        .move_colour
        .unwrap_or_else(|| parent.state.position.turn());

    let top_move_played = previous.top_move.as_ref() == Some(&played);

    let mut classification = if top_move_played {
        Classification::Best
    } else {
        point_loss_classify(previous.evaluation, current.evaluation, mover)
    };

    if top_move_played
        && options.include_critical
        && consider_critical(&previous, &current, &played, mover)
    {
        classification = classification.upgrade(Classification::Critical, Classification::Best);
    }

    if options.include_brilliant && consider_brilliant(&previous, &current, &played, mover) {
        classification = classification.upgrade(Classification::Brilliant, Classification::Best);
    }

    Ok(classification)
}
