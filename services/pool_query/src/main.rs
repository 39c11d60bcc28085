//! Pool Query
//!
//! Read-only inspection of weighted pool contracts and the network table.
//! Results are printed as JSON on stdout; logs go to stderr and are
//! controlled with `RUST_LOG`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ethers::providers::{Http, Provider};
use ethers::types::Address;
use network_config::{NetworkConfig, NetworkTable};
use pool_client::{
    pool_event_topics, to_hex_string, EthersChain, Pool, PoolAbi, PoolConfig, LOG_EXIT, LOG_JOIN,
    LOG_SWAP,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Environment prefix for network table overrides, e.g.
/// `POOL_SDK__NETWORKS__POLYGON__NODE_URI`
const ENV_PREFIX: &str = "POOL_SDK";

#[derive(Parser)]
#[command(name = "pool-query")]
#[command(about = "Query weighted pool contracts and network deployments")]
#[command(version)]
struct Cli {
    /// Network to resolve the RPC endpoint and gas settings from
    #[arg(short, long, default_value = "development", global = true)]
    network: String,

    /// RPC endpoint, overriding the network's node URI
    #[arg(long, global = true)]
    rpc: Option<String>,

    /// TOML file layered over the built-in network table
    #[arg(long, global = true)]
    networks_file: Option<PathBuf>,

    /// Infura project id appended to infura node URIs
    #[arg(long, global = true)]
    project_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List known networks
    Networks,
    /// Print the resolved record for a network name or chain id
    Config {
        /// Network name; defaults to --network
        name: Option<String>,
        /// Resolve by chain id instead of name
        #[arg(long, conflicts_with = "name")]
        chain_id: Option<u64>,
    },
    /// Pool balance of a token
    Reserve {
        #[arg(long)]
        pool: Address,
        #[arg(long)]
        token: Address,
        /// Token decimals; looked up on-chain when omitted
        #[arg(long)]
        decimals: Option<u8>,
    },
    /// Spot price of token-out in token-in, fees included
    SpotPrice {
        #[arg(long)]
        pool: Address,
        #[arg(long)]
        token_in: Address,
        #[arg(long)]
        token_out: Address,
        /// Consume market swap fee as a fraction
        #[arg(long, default_value = "0")]
        market_fee: String,
    },
    /// Pool shares held by an account
    Shares {
        #[arg(long)]
        pool: Address,
        #[arg(long)]
        account: Address,
    },
    /// Pool tokens and roles
    Tokens {
        #[arg(long)]
        pool: Address,
    },
    /// Fee rates, collectors and uncollected fees
    Fees {
        #[arg(long)]
        pool: Address,
    },
    /// Log topics of the pool events
    EventTopics,
}

fn load_table(cli: &Cli) -> Result<NetworkTable> {
    NetworkTable::load(cli.networks_file.as_deref(), Some(ENV_PREFIX))
        .context("Failed to load network table")
}

fn resolve_network(cli: &Cli, table: &NetworkTable) -> NetworkConfig {
    match &cli.project_id {
        Some(project_id) => table.get_config_with_project_id(&cli.network, project_id),
        None => table.get_config(&cli.network),
    }
}

type HttpPool = Pool<EthersChain<Provider<Http>>>;

fn connect(cli: &Cli, network: &NetworkConfig) -> Result<HttpPool> {
    let rpc = match (&cli.rpc, &network.node_uri) {
        (Some(rpc), _) => rpc.clone(),
        (None, Some(node_uri)) => node_uri.clone(),
        (None, None) => bail!("Network '{}' has no node URI; pass --rpc", cli.network),
    };
    debug!("Connecting to {}", rpc);

    let chain = EthersChain::connect(&rpc).context("Failed to create provider")?;
    let pool = Pool::new(Arc::new(chain), PoolConfig::from_network(network))
        .context("Failed to load pool ABI")?;
    Ok(pool)
}

fn print(value: serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pool_client=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let table = load_table(&cli)?;

    match &cli.command {
        Commands::Networks => {
            let networks: Vec<_> = table
                .network_names()
                .into_iter()
                .map(|name| {
                    let config = table.get_config(name);
                    json!({ "network": name, "chainId": config.chain_id })
                })
                .collect();
            print(json!(networks))?;
        }
        Commands::Config { name, chain_id } => {
            let config = match (name, chain_id) {
                (_, Some(chain_id)) => table.get_config_by_chain_id(*chain_id),
                (Some(name), None) => table.get_config(name),
                (None, None) => resolve_network(&cli, &table),
            };
            if !config.is_known() {
                info!("Network '{}' is not in the table", config.network);
            }
            print(serde_json::to_value(&config)?)?;
        }
        Commands::Reserve {
            pool,
            token,
            decimals,
        } => {
            let client = connect(&cli, &resolve_network(&cli, &table))?;
            let reserve = client.get_reserve(*pool, *token, *decimals).await?;
            print(json!({ "pool": pool, "token": token, "reserve": reserve }))?;
        }
        Commands::SpotPrice {
            pool,
            token_in,
            token_out,
            market_fee,
        } => {
            let client = connect(&cli, &resolve_network(&cli, &table))?;
            let price = client
                .get_spot_price(*pool, *token_in, *token_out, market_fee)
                .await?;
            print(json!({
                "pool": pool,
                "tokenIn": token_in,
                "tokenOut": token_out,
                "spotPrice": price,
            }))?;
        }
        Commands::Shares { pool, account } => {
            let client = connect(&cli, &resolve_network(&cli, &table))?;
            let shares = client.shares_balance(*account, *pool).await?;
            let total = client.get_pool_shares_total_supply(*pool).await?;
            print(json!({ "account": account, "shares": shares, "totalSupply": total }))?;
        }
        Commands::Tokens { pool } => {
            let client = connect(&cli, &resolve_network(&cli, &table))?;
            print(json!({
                "pool": pool,
                "finalized": client.is_finalized(*pool).await?,
                "tokens": client.get_current_tokens(*pool).await?,
                "baseToken": client.get_base_token(*pool).await?,
                "datatoken": client.get_datatoken(*pool).await?,
                "controller": client.get_controller(*pool).await?,
            }))?;
        }
        Commands::Fees { pool } => {
            let client = connect(&cli, &resolve_network(&cli, &table))?;
            print(json!({
                "pool": pool,
                "swapFee": client.get_swap_fee(*pool).await?,
                "marketFee": client.get_market_fee(*pool).await?,
                "opcFee": client.get_opc_fee(*pool).await?,
                "marketFeeCollector": client.get_market_fee_collector(*pool).await?,
                "opcCollector": client.get_opc_collector(*pool).await?,
                "currentMarketFees": client.get_current_market_fees(*pool).await?,
                "currentOpcFees": client.get_current_opc_fees(*pool).await?,
            }))?;
        }
        Commands::EventTopics => {
            let [swap, join, exit] = pool_event_topics(&PoolAbi::load()?)?;
            print(json!({
                LOG_SWAP: to_hex_string(swap),
                LOG_JOIN: to_hex_string(join),
                LOG_EXIT: to_hex_string(exit),
            }))?;
        }
    }

    Ok(())
}
