/// Application name
pub const APP_NAME: &str = "City Secrets";

/// Hosted content service used when no base URL is configured
pub const DEFAULT_API_BASE_URL: &str = "https://city-secrets-backend-6ptmq.ondigitalocean.app";

/// Local JSON-RPC endpoint (hardhat / anvil default)
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Value attached to a paid vote: 0.01 ether in wei
pub const DEFAULT_VOTE_VALUE_WEI: u128 = 10_000_000_000_000_000;

/// Gas limit sent with every vote transaction
pub const VOTE_GAS_LIMIT: u64 = 200_000;

/// Maximum number of on-chain lookups in flight per list refresh
pub const DEFAULT_FANOUT: usize = 8;

/// Key under which the connected wallet address is persisted
pub const SESSION_ADDRESS_KEY: &str = "walletAddress";

/// Level assigned to a freshly registered user
pub const INITIAL_USER_LEVEL: u64 = 1;

/// Credibility points per level step
pub const SCORE_PER_LEVEL: u64 = 10;

/// Name of the event emitted by `createSpot`
pub const SPOT_CREATED_EVENT: &str = "SpotCreated";

/// Revert reasons emitted by the SecretSpots contract
pub const REVERT_NOT_REGISTERED: &str = "User not registered";
pub const REVERT_ALREADY_REGISTERED: &str = "User already registered";
pub const REVERT_ALREADY_VOTED: &str = "Already voted";
pub const REVERT_OWN_SPOT: &str = "Cannot vote own spot";
pub const REVERT_NOT_CREATOR: &str = "Not spot creator";
pub const REVERT_INSUFFICIENT_PAYMENT: &str = "Insufficient vote payment";
