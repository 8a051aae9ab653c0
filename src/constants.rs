pub const DEFAULT_NETWORK: &str = "mainnet-fork";
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_EXPLORER_API_URL: &str = "https://api.etherscan.io/api";

// Uniswap V2 router
pub const UNISWAP_ROUTER_ADDRESS: &str = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D";
pub const WETH_ADDRESS: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
pub const DAI_ADDRESS: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";

pub const DEFAULT_SWAP_AMOUNT_WEI: u128 = 1_000_000_000_000_000_000; // 1 ETH
pub const DEFAULT_DEADLINE_WINDOW_SECS: u64 = 120;

pub const SWAP_FUNCTION: &str = "swapExactETHForTokens";

/// Used when no explorer API key is available to fetch the verified ABI.
pub const BUNDLED_ROUTER_ABI: &[&str] = &[
    "function WETH() external pure returns (address)",
    "function factory() external pure returns (address)",
    "function swapExactETHForTokens(uint256 amountOutMin, address[] path, address to, uint256 deadline) external payable returns (uint256[] amounts)",
];
