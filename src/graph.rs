//! Asset Graph - Cross-Chain Topology
//!
//! Directed graph over `(chain_id, symbol)` asset nodes. Bridge edges
//! connect the same symbol across chains, always in both directions.
//! Discovery walks the bridge edges and cross-products each one with the
//! source chain's configured DEX route pairs.

use alloy_primitives::Address;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::registry::{ChainRegistry, DexId};
use crate::tokens::Token;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("asset {symbol} on chain {chain_id} has a zero address")]
    ZeroAddress { chain_id: u64, symbol: String },
}

/// One asset on one chain. Identity is `(chain_id, symbol)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetNode {
    pub chain_id: u64,
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

/// Bridge edge payload. Routing cost is a placeholder until a bridge
/// quote prices the route at evaluation time.
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeEdge {
    pub weight: f64,
}

/// A candidate two-hop trade: borrow `token` on `src_chain`, swap out and
/// back across the `route` DEX pair, settle against `dst_chain` pricing.
#[derive(Debug, Clone)]
pub struct Opportunity {
    pub src_chain: u64,
    pub dst_chain: u64,
    pub token: String,
    pub src_address: Address,
    pub dst_address: Address,
    pub decimals: u8,
    pub route: (DexId, DexId),
}

// ============================================
// GRAPH
// ============================================

pub struct AssetGraph {
    graph: DiGraph<AssetNode, BridgeEdge>,
    node_indices: HashMap<(u64, String), NodeIndex>,
}

impl Default for AssetGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
        }
    }

    /// Insert an asset node. Returns `Ok(false)` when the `(chain,
    /// symbol)` identity already exists; the existing node is untouched.
    pub fn add_node(
        &mut self,
        chain_id: u64,
        symbol: &str,
        address: Address,
        decimals: u8,
    ) -> Result<bool, GraphError> {
        if address.is_zero() {
            return Err(GraphError::ZeroAddress {
                chain_id,
                symbol: symbol.to_string(),
            });
        }

        let key = (chain_id, symbol.to_string());
        if self.node_indices.contains_key(&key) {
            return Ok(false);
        }

        let idx = self.graph.add_node(AssetNode {
            chain_id,
            symbol: symbol.to_string(),
            address,
            decimals,
        });
        self.node_indices.insert(key, idx);
        Ok(true)
    }

    /// Build a graph from the static inventory. Chains are visited in
    /// sorted order so node and edge order is reproducible run to run.
    pub fn from_inventory(inventory: &HashMap<u64, Vec<Token>>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        let mut chains: Vec<u64> = inventory.keys().copied().collect();
        chains.sort_unstable();

        for chain_id in chains {
            for token in &inventory[&chain_id] {
                graph.add_node(chain_id, token.symbol, token.address, token.decimals)?;
            }
        }
        Ok(graph)
    }

    /// Connect every pair of chains that both list a bridgeable symbol,
    /// one directed edge each way. Returns the number of edges added.
    pub fn build_bridge_edges(&mut self, bridge_symbols: &[&str]) -> usize {
        let mut added = 0;

        for symbol in bridge_symbols {
            let mut nodes: Vec<(u64, NodeIndex)> = self
                .node_indices
                .iter()
                .filter(|((_, s), _)| s.as_str() == *symbol)
                .map(|((chain, _), idx)| (*chain, *idx))
                .collect();
            nodes.sort_unstable_by_key(|(chain, _)| *chain);

            for i in 0..nodes.len() {
                for j in (i + 1)..nodes.len() {
                    let (a, b) = (nodes[i].1, nodes[j].1);
                    self.graph.add_edge(a, b, BridgeEdge::default());
                    self.graph.add_edge(b, a, BridgeEdge::default());
                    added += 2;
                }
            }
        }

        debug!(edges = added, "bridge edges built");
        added
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Walk bridge edges and emit one candidate per (edge, source-chain
    /// route pair). Same-chain edges can't exist by construction but are
    /// filtered anyway; the output never contains `src_chain ==
    /// dst_chain`. Deterministic given identical graph state.
    pub fn opportunities<'a>(
        &'a self,
        registry: &'a ChainRegistry,
    ) -> impl Iterator<Item = Opportunity> + 'a {
        self.graph.edge_references().flat_map(move |edge| {
            let src = &self.graph[edge.source()];
            let dst = &self.graph[edge.target()];

            let routes: &[(DexId, DexId)] = if src.chain_id == dst.chain_id {
                &[]
            } else {
                registry
                    .get(src.chain_id)
                    .map(|c| c.route_pairs.as_slice())
                    .unwrap_or(&[])
            };

            routes.iter().map(move |route| Opportunity {
                src_chain: src.chain_id,
                dst_chain: dst.chain_id,
                token: src.symbol.clone(),
                src_address: src.address,
                dst_address: dst.address,
                decimals: src.decimals,
                route: *route,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens;
    use alloy_primitives::address;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    #[test]
    fn add_node_is_idempotent() {
        let mut g = AssetGraph::new();
        assert!(g.add_node(1, "USDC", addr(1), 6).unwrap());
        assert!(!g.add_node(1, "USDC", addr(2), 6).unwrap());
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn zero_address_rejected() {
        let mut g = AssetGraph::new();
        let err = g.add_node(1, "USDC", Address::ZERO, 6);
        assert!(matches!(err, Err(GraphError::ZeroAddress { .. })));
        assert_eq!(g.node_count(), 0);
    }

    #[test]
    fn bridge_edges_are_bidirectional_pairs() {
        let mut g = AssetGraph::new();
        g.add_node(1, "USDC", addr(1), 6).unwrap();
        g.add_node(137, "USDC", addr(2), 6).unwrap();
        g.add_node(42161, "USDC", addr(3), 6).unwrap();
        // Not bridgeable, must not get edges.
        g.add_node(1, "CRV", addr(4), 18).unwrap();

        let added = g.build_bridge_edges(&["USDC"]);
        // 3 chains pairwise = 3 pairs x 2 directions.
        assert_eq!(added, 6);
        assert_eq!(g.edge_count(), 6);
    }

    #[test]
    fn opportunities_never_pair_a_chain_with_itself() {
        let inv = tokens::inventory();
        let mut g = AssetGraph::from_inventory(&inv).unwrap();
        g.build_bridge_edges(&tokens::BRIDGE_ASSETS);
        let registry = ChainRegistry::bootstrap();

        let opps: Vec<Opportunity> = g.opportunities(&registry).collect();
        assert!(!opps.is_empty());
        for opp in &opps {
            assert_ne!(opp.src_chain, opp.dst_chain, "{opp:?}");
        }
    }

    #[test]
    fn discovery_is_deterministic() {
        let build = || {
            let inv = tokens::inventory();
            let mut g = AssetGraph::from_inventory(&inv).unwrap();
            g.build_bridge_edges(&tokens::BRIDGE_ASSETS);
            g
        };
        let registry = ChainRegistry::bootstrap();

        let a: Vec<String> = build()
            .opportunities(&registry)
            .map(|o| format!("{}-{}-{}-{:?}", o.src_chain, o.dst_chain, o.token, o.route))
            .collect();
        let b: Vec<String> = build()
            .opportunities(&registry)
            .map(|o| format!("{}-{}-{}-{:?}", o.src_chain, o.dst_chain, o.token, o.route))
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn route_pairs_come_from_source_chain() {
        let mut g = AssetGraph::new();
        g.add_node(1, "USDC", address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), 6)
            .unwrap();
        g.add_node(137, "USDC", address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174"), 6)
            .unwrap();
        g.build_bridge_edges(&["USDC"]);
        let registry = ChainRegistry::bootstrap();

        for opp in g.opportunities(&registry) {
            let chain = registry.get(opp.src_chain).unwrap();
            assert!(chain.route_pairs.contains(&opp.route));
        }
    }
}
