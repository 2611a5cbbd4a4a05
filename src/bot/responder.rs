use std::sync::Arc;
use std::time::Duration;

use crate::bot::dispatcher::Action;
use crate::bot::menu::MenuStateStore;
use crate::bot::replies::{menu_text, RESET_NOTICE};
use crate::client::{ClientError, MessagingClient};
use crate::types::{ChatStateType, JID};

/// Carries out conversation actions against a messaging client.
pub struct Responder<C> {
    client: Arc<C>,
    menus: Arc<MenuStateStore>,
    typing_delay: Duration,
}

impl<C: MessagingClient> Responder<C> {
    pub fn new(client: Arc<C>, menus: Arc<MenuStateStore>, typing_delay: Duration) -> Self {
        Self {
            client,
            menus,
            typing_delay,
        }
    }

    pub fn menus(&self) -> &MenuStateStore {
        &self.menus
    }

    /// Perform `action` for `sender`, including its menu state change.
    pub async fn execute(&self, sender: &JID, action: Action) -> Result<(), ClientError> {
        match action {
            Action::Ignore => Ok(()),
            Action::SendMenu => self.send_menu(sender).await,
            Action::SendCannedReply(text) => self.send_reply(sender, text).await,
            Action::SendResetNotice => {
                self.menus.clear(sender);
                self.client.send_message(sender, RESET_NOTICE).await?;
                Ok(())
            }
        }
    }

    /// Send the greeting menu, addressing the sender by first name.
    ///
    /// The sender is only marked once the menu has actually been sent.
    pub async fn send_menu(&self, sender: &JID) -> Result<(), ClientError> {
        self.menus.clear(sender);
        self.simulate_typing(sender).await?;

        let contact = self.client.contact(sender).await?;
        self.client
            .send_message(sender, &menu_text(contact.first_name()))
            .await?;

        self.menus.mark_menu_sent(sender);
        Ok(())
    }

    /// Send `text` verbatim after the typing pause.
    pub async fn send_reply(&self, sender: &JID, text: &str) -> Result<(), ClientError> {
        self.simulate_typing(sender).await?;
        self.client.send_message(sender, text).await?;
        Ok(())
    }

    async fn simulate_typing(&self, sender: &JID) -> Result<(), ClientError> {
        let chat = self.client.chat(sender).await?;
        tokio::time::sleep(self.typing_delay).await;
        self.client
            .send_chat_state(&chat, ChatStateType::Composing)
            .await?;
        tokio::time::sleep(self.typing_delay).await;
        Ok(())
    }
}
