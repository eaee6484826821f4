//! Branching position/move tree.
//!
//! Nodes live in an arena owned by [`GameTree`]. A parent lists its children
//! in order (index 0 is the principal continuation); a child refers back to
//! its parent by [`NodeId`] only.

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};

use crate::classification::Classification;
use crate::engine_line::EngineLine;
use crate::error::TreeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The move that produced a node, in both notations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedMove {
    pub san: String,
    pub uci: String,
}

/// Everything analysis attaches to a node.
#[derive(Debug, Clone)]
pub struct NodeState {
    pub position: Chess,
    pub played: Option<PlayedMove>,
    /// Side that moved into this position (None at the root)
    pub move_colour: Option<Color>,
    pub engine_lines: Vec<EngineLine>,
    pub classification: Option<Classification>,
    pub accuracy: Option<f64>,
    pub opening: Option<String>,
}

impl NodeState {
    fn new(position: Chess) -> Self {
        Self {
            position,
            played: None,
            move_colour: None,
            engine_lines: Vec::new(),
            classification: None,
            accuracy: None,
            opening: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub state: NodeState,
}

impl TreeNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn fen(&self) -> String {
        fen_string(&self.state.position)
    }
}

/// Full FEN of a position.
pub fn fen_string(position: &Chess) -> String {
    Fen::from_position(position, EnPassantMode::Legal).to_string()
}

/// Parse a full FEN into a playable position.
pub fn parse_fen(fen: &str) -> Result<Chess, TreeError> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|e| TreeError::InvalidFen(format!("{fen}: {e}")))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| TreeError::InvalidFen(format!("{fen}: {e}")))
}

#[derive(Debug, Clone)]
pub struct GameTree {
    nodes: Vec<Option<TreeNode>>,
    root: NodeId,
}

impl Default for GameTree {
    fn default() -> Self {
        Self::new(Chess::default())
    }
}

impl GameTree {
    pub fn new(initial: Chess) -> Self {
        let root = NodeId(0);
        Self {
            nodes: vec![Some(TreeNode {
                id: root,
                parent: None,
                children: Vec::new(),
                state: NodeState::new(initial),
            })],
            root,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, TreeError> {
        Ok(Self::new(parse_fen(fen)?))
    }

    /// Build a mainline-only tree from SAN moves played from the standard
    /// starting position.
    pub fn from_san_moves<S: AsRef<str>>(moves: &[S]) -> Result<Self, TreeError> {
        let mut tree = Self::default();
        let mut current = tree.root();
        for san in moves {
            current = tree.add_san(current, san.as_ref())?;
        }
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn initial_position(&self) -> &Chess {
        // The root slot is never vacated
        self.nodes[self.root.0]
            .as_ref()
            .map(|node| &node.state.position)
            .unwrap_or_else(|| unreachable!("root node removed"))
    }

    pub fn initial_fen(&self) -> String {
        fen_string(self.initial_position())
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn node(&self, id: NodeId) -> Result<&TreeNode, TreeError> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut TreeNode, TreeError> {
        self.get_mut(id).ok_or(TreeError::UnknownNode(id))
    }

    pub fn parent_of(&self, id: NodeId) -> Option<&TreeNode> {
        self.get(id)?.parent.and_then(|parent| self.get(parent))
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter().flatten()
    }

    /// Add a legal move below `parent`. Playing a move that already exists as
    /// a child returns that child.
    pub fn add_move(&mut self, parent: NodeId, mv: &Move) -> Result<NodeId, TreeError> {
        let parent_node = self.node(parent)?;
        let position = parent_node.state.position.clone();

        if !position.legal_moves().contains(mv) {
            return Err(TreeError::IllegalMove {
                mv: format!("{mv:?}"),
                fen: fen_string(&position),
            });
        }

        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        if let Some(existing) = parent_node.children.iter().copied().find(|child| {
            self.get(*child)
                .and_then(|node| node.state.played.as_ref())
                .is_some_and(|played| played.uci == uci)
        }) {
            return Ok(existing);
        }

        let mut after = position.clone();
        let san = SanPlus::from_move_and_play_unchecked(&mut after, *mv).to_string();

        let id = NodeId(self.nodes.len());
        let mut state = NodeState::new(after);
        state.played = Some(PlayedMove { san, uci });
        state.move_colour = Some(position.turn());

        self.nodes.push(Some(TreeNode {
            id,
            parent: Some(parent),
            children: Vec::new(),
            state,
        }));
        self.node_mut(parent)?.children.push(id);

        Ok(id)
    }

    pub fn add_san(&mut self, parent: NodeId, san: &str) -> Result<NodeId, TreeError> {
        let position = &self.node(parent)?.state.position;
        let illegal = || TreeError::IllegalMove {
            mv: san.to_string(),
            fen: fen_string(position),
        };
        let parsed: SanPlus = san.parse().map_err(|_| illegal())?;
        let mv = parsed.san.to_move(position).map_err(|_| illegal())?;
        self.add_move(parent, &mv)
    }

    pub fn add_uci(&mut self, parent: NodeId, uci: &str) -> Result<NodeId, TreeError> {
        let position = &self.node(parent)?.state.position;
        let illegal = || TreeError::IllegalMove {
            mv: uci.to_string(),
            fen: fen_string(position),
        };
        let parsed: UciMove = uci.parse().map_err(|_| illegal())?;
        let mv = parsed.to_move(position).map_err(|_| illegal())?;
        self.add_move(parent, &mv)
    }

    /// Remove a node and everything below it. Returns how many nodes were
    /// removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<usize, TreeError> {
        if id == self.root {
            return Err(TreeError::RemoveRoot);
        }
        let parent = self.node(id)?.parent;

        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|child| *child != id);
        }

        let mut removed = 0;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(Option::take) {
                pending.extend(node.children);
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Make `id` its parent's principal continuation.
    pub fn promote(&mut self, id: NodeId) -> Result<(), TreeError> {
        let parent = self.node(id)?.parent.ok_or(TreeError::UnknownNode(id))?;
        let siblings = &mut self.node_mut(parent)?.children;
        siblings.retain(|child| *child != id);
        siblings.insert(0, id);
        Ok(())
    }

    /// `from` followed by each successive principal continuation.
    pub fn node_chain(&self, from: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.get(from);
        while let Some(node) = current {
            chain.push(node.id);
            current = node.children.first().and_then(|child| self.get(*child));
        }
        chain
    }

    pub fn mainline(&self) -> Vec<NodeId> {
        self.node_chain(self.root)
    }

    /// UCI moves leading from the root to `id`.
    pub fn path_moves(&self, id: NodeId) -> Result<Vec<String>, TreeError> {
        let mut moves = Vec::new();
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent {
            if let Some(played) = &current.state.played {
                moves.push(played.uci.clone());
            }
            current = self.node(parent)?;
        }
        moves.reverse();
        Ok(moves)
    }
}
