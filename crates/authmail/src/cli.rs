//! Interactive command prompt.
//!
//! Owns no state of its own: every command is a call into the services,
//! and every failure is rendered and swallowed so the loop keeps running.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

use authmail_core::{
    AuthProvider, AuthService, CallbackListener, IdentityStore, IntegrationStatus, MailSender,
    MailService,
};

/// The operator-facing prompt loop.
pub struct Cli<M, P, S, L> {
    auth: Arc<AuthService<P, S, L>>,
    mail: MailService<M, P, S, L>,
    input: Lines<BufReader<Stdin>>,
}

impl<M, P, S, L> Cli<M, P, S, L>
where
    M: MailSender,
    P: AuthProvider,
    S: IdentityStore,
    L: CallbackListener,
{
    /// Creates the prompt over standard input.
    pub fn new(auth: Arc<AuthService<P, S, L>>, mail: MailService<M, P, S, L>) -> Self {
        Self {
            auth,
            mail,
            input: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Runs the prompt loop until `exit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error only if standard input or output fails; command
    /// failures are printed and the loop continues.
    pub async fn run(mut self) -> Result<()> {
        println!("{}", "=".repeat(50));
        println!("  authmail - Gmail console client");
        println!("{}", "=".repeat(50));
        println!();
        println!("Commands:");
        println!("  auth  - Authenticate via Google OAuth2");
        println!("  send  - Send an email (interactive)");
        println!("  exit  - Quit");
        println!();

        loop {
            let Some(line) = self.prompt("> ").await? else {
                break;
            };
            let command = line.trim().to_lowercase();
            match command.as_str() {
                "" => {}
                "auth" => {
                    if let Err(err) = self.handle_auth().await {
                        println!("Error: {err}");
                    }
                }
                "send" => {
                    if let Err(err) = self.handle_send().await {
                        println!("Error: {err}");
                    }
                }
                "exit" | "quit" => {
                    println!("Goodbye!");
                    break;
                }
                other => {
                    println!("Unknown command: \"{other}\". Use: auth, send, exit");
                }
            }
        }
        Ok(())
    }

    async fn handle_auth(&mut self) -> Result<()> {
        match self.auth.check_integration().await? {
            IntegrationStatus::Active => {
                println!("Integration is active.");
            }
            IntegrationStatus::Inactive { auth_url } => {
                println!("Open this URL in your browser to authorize:");
                println!();
                println!("{auth_url}");
                println!();
                if let Err(err) = opener::open_browser(&auth_url) {
                    warn!("could not open the browser: {err}");
                }
                println!("Waiting for authorization...");

                let identity = self.auth.authenticate().await?;
                let who = identity.profile.name.unwrap_or(identity.email);
                println!("Authenticated as {who}");
            }
        }
        Ok(())
    }

    async fn handle_send(&mut self) -> Result<()> {
        let to = self.answer("To: ").await?;
        if to.is_empty() {
            println!("Recipient address is required.");
            return Ok(());
        }

        let subject = self.answer("Subject: ").await?;
        if subject.is_empty() {
            println!("Subject is required.");
            return Ok(());
        }

        println!("Body (enter an empty line to finish):");
        let mut lines = Vec::new();
        loop {
            let line = self.answer("").await?;
            if line.is_empty() {
                break;
            }
            lines.push(line);
        }
        let body = lines.join("\n");
        if body.is_empty() {
            println!("Body is required.");
            return Ok(());
        }

        println!("Sending email...");
        let receipt = self.mail.send(&to, &subject, &body).await?;
        match receipt.message_id {
            Some(id) => println!("Email sent successfully! Message ID: {id}"),
            None => println!("Email sent successfully!"),
        }
        Ok(())
    }

    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        print!("{label}");
        io::stdout().flush()?;
        Ok(self.input.next_line().await?)
    }

    async fn answer(&mut self, label: &str) -> Result<String> {
        Ok(self
            .prompt(label)
            .await?
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}
