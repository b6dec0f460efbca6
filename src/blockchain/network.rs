//! Named networks and endpoint resolution.

use serde::{Deserialize, Serialize};
use url::Url;

/// Networks that can be selected by name instead of a raw RPC URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NamedNetwork {
    Sepolia,
    Holesky,
    Polygon,
    PolygonAmoy,
    Astar,
    Anvil,
}

impl NamedNetwork {
    pub const ALL: [NamedNetwork; 6] = [
        Self::Sepolia,
        Self::Holesky,
        Self::Polygon,
        Self::PolygonAmoy,
        Self::Astar,
        Self::Anvil,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sepolia => "sepolia",
            Self::Holesky => "holesky",
            Self::Polygon => "polygon",
            Self::PolygonAmoy => "polygon-amoy",
            Self::Astar => "astar",
            Self::Anvil => "anvil",
        }
    }

    /// Public JSON-RPC endpoint.
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Self::Sepolia => "https://rpc.sepolia.org",
            Self::Holesky => "https://ethereum-holesky-rpc.publicnode.com",
            Self::Polygon => "https://polygon-rpc.com",
            Self::PolygonAmoy => "https://rpc-amoy.polygon.technology",
            Self::Astar => "https://evm.astar.network",
            Self::Anvil => "http://127.0.0.1:8545",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Sepolia => 11_155_111,
            Self::Holesky => 17_000,
            Self::Polygon => 137,
            Self::PolygonAmoy => 80_002,
            Self::Astar => 592,
            Self::Anvil => 31_337,
        }
    }
}

impl std::fmt::Display for NamedNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved RPC endpoint the loop connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Network name for logs, or the URL host for custom endpoints.
    pub label: String,
    pub url: Url,
    /// When set, `connect` refuses a node reporting a different chain.
    pub expected_chain_id: Option<u64>,
}

impl Endpoint {
    pub fn named(network: NamedNetwork) -> Self {
        Self {
            label: network.as_str().to_string(),
            url: Url::parse(network.rpc_url()).expect("static RPC URL table is well-formed"),
            expected_chain_id: Some(network.chain_id()),
        }
    }

    pub fn custom(url: Url, expected_chain_id: Option<u64>) -> Self {
        Self {
            label: url.host_str().unwrap_or("custom").to_string(),
            url,
            expected_chain_id,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.url)
    }
}
