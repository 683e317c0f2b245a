//! Top-level wiring of chains, wallet, messenger and controller.

use std::sync::Arc;

use crate::{
    config::Config,
    controller::{BridgeController, BridgeOperation, ControllerSettings},
    error::Result,
    explorer::ExplorerLinks,
    messenger::{CrossChainMessenger, OpMessenger},
    render::{CONNECT_PROMPT, render_operation},
    wallet::Wallet,
};

/// What the front end should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// No wallet is connected; the bridge action is not offered.
    ConnectPrompt,
    Bridge(BridgeOperation),
}

pub struct BridgeApp<M> {
    controller: Option<BridgeController<M>>,
    links: ExplorerLinks,
}

impl<M: CrossChainMessenger> BridgeApp<M> {
    pub fn new(controller: Option<BridgeController<M>>, links: ExplorerLinks) -> Self {
        Self { controller, links }
    }

    /// `None` until a wallet is connected.
    pub fn controller(&self) -> Option<&BridgeController<M>> {
        self.controller.as_ref()
    }

    pub fn links(&self) -> &ExplorerLinks {
        &self.links
    }

    pub fn view(&self) -> View {
        match &self.controller {
            Some(controller) => View::Bridge(controller.snapshot()),
            None => View::ConnectPrompt,
        }
    }

    pub fn render(&self) -> Vec<String> {
        match self.view() {
            View::ConnectPrompt => vec![CONNECT_PROMPT.to_string()],
            View::Bridge(op) => render_operation(&op, &self.links),
        }
    }
}

impl BridgeApp<OpMessenger> {
    /// Build the app against the configured chains.
    ///
    /// Without a connected wallet no provider is created and the app shows the
    /// connect prompt.
    pub async fn connect(config: &Config, wallet: Wallet) -> Result<Self> {
        let links = ExplorerLinks::from_config(config);
        let Some(signer) = wallet.signer().cloned() else {
            tracing::info!("no wallet connected");
            return Ok(Self::new(None, links));
        };

        let settings = ControllerSettings::from_config(config)?;
        let messenger = OpMessenger::new(config, Some(signer))?;
        messenger.verify_chains().await?;

        tracing::info!(
            l1 = %config.l1.name,
            l2 = %config.l2.name,
            sender = ?wallet.address(),
            amount = %settings.amount,
            "bridge ready"
        );

        let controller = BridgeController::new(Arc::new(messenger), settings);
        Ok(Self::new(Some(controller), links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        portal_address = "0x49048044D57e1C92A77f79988d21Fa8fAF74E97e"

        [l1]
        name = "sepolia"
        chain_id = 11155111
        rpc_url = "http://127.0.0.1:1"
        explorer_url = "https://sepolia.etherscan.io/"

        [l2]
        name = "op-sepolia"
        chain_id = 11155420
        rpc_url = "http://127.0.0.1:2"
        explorer_url = "https://sepolia-optimism.etherscan.io"
    "#;

    #[tokio::test]
    async fn test_disconnected_wallet_shows_connect_prompt() {
        let config = Config::from_toml(CONFIG).unwrap();
        let app = BridgeApp::connect(&config, Wallet::disconnected())
            .await
            .unwrap();

        assert!(app.controller().is_none());
        assert_eq!(app.view(), View::ConnectPrompt);
        assert_eq!(app.render(), vec![CONNECT_PROMPT.to_string()]);
        assert_eq!(
            app.links().tx_url(crate::explorer::ChainSide::L1, "0xaa"),
            "https://sepolia.etherscan.io/tx/0xaa"
        );
    }

    #[tokio::test]
    async fn test_connect_fails_on_unreachable_rpc() {
        let config = Config::from_toml(CONFIG).unwrap();
        let signer = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            .parse()
            .unwrap();

        let result = BridgeApp::connect(&config, Wallet::connected(signer)).await;
        assert!(matches!(result, Err(crate::BridgeError::Rpc(_))));
    }
}
