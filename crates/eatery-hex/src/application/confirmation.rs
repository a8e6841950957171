use std::time::Duration;

use async_trait::async_trait;
use eatery_types::domain::payment::PaymentReference;
use eatery_types::ports::payment_confirmation::{ConfirmationOutcome, PaymentConfirmation};
use eatery_types::ports::payment_gateway::{GatewayError, InitializedTransaction};

/// Settlement wait used when the browser flow gives no completion signal.
pub const DEFAULT_SETTLEMENT_DELAY: Duration = Duration::from_secs(3);

/// What an in-app payment widget reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetResult {
    Success { reference: Option<PaymentReference> },
    Closed,
}

/// In-app payment widget, available on native platforms only.
#[async_trait]
pub trait EmbeddedCheckout: Send + Sync + 'static {
    async fn present(&self, transaction: &InitializedTransaction) -> WidgetResult;
}

/// External or in-app browser session.
#[async_trait]
pub trait BrowserLauncher: Send + Sync + 'static {
    /// Resolves once the user dismisses the browser.
    async fn open(&self, url: &str) -> anyhow::Result<()>;
}

/// Widget-driven confirmation: the widget tells us success or close.
pub struct CallbackConfirmation<E> {
    widget: E,
    settlement_delay: Duration,
}

impl<E: EmbeddedCheckout> CallbackConfirmation<E> {
    pub fn new(widget: E) -> Self {
        Self {
            widget,
            settlement_delay: Duration::ZERO,
        }
    }

    pub fn with_settlement_delay(mut self, delay: Duration) -> Self {
        self.settlement_delay = delay;
        self
    }
}

#[async_trait]
impl<E: EmbeddedCheckout> PaymentConfirmation for CallbackConfirmation<E> {
    async fn await_confirmation(
        &self,
        transaction: &InitializedTransaction,
    ) -> Result<ConfirmationOutcome, GatewayError> {
        match self.widget.present(transaction).await {
            WidgetResult::Success { reference } => Ok(ConfirmationOutcome::Completed(
                reference
                    .filter(|r| !r.is_blank())
                    .unwrap_or_else(|| transaction.reference.clone()),
            )),
            WidgetResult::Closed => Ok(ConfirmationOutcome::Cancelled),
        }
    }

    fn settlement_delay(&self) -> Duration {
        self.settlement_delay
    }
}

/// Browser-driven confirmation. The browser closing says nothing about the
/// payment, so the outcome is always left to verification.
pub struct PollConfirmation<B> {
    browser: B,
    settlement_delay: Duration,
}

impl<B: BrowserLauncher> PollConfirmation<B> {
    pub fn new(browser: B, settlement_delay: Duration) -> Self {
        Self {
            browser,
            settlement_delay,
        }
    }
}

#[async_trait]
impl<B: BrowserLauncher> PaymentConfirmation for PollConfirmation<B> {
    async fn await_confirmation(
        &self,
        transaction: &InitializedTransaction,
    ) -> Result<ConfirmationOutcome, GatewayError> {
        self.browser
            .open(&transaction.authorization_url)
            .await
            .map_err(|e| GatewayError::Transport(format!("could not open payment page: {e}")))?;
        tracing::debug!(reference = %transaction.reference, "payment browser dismissed");
        Ok(ConfirmationOutcome::Completed(transaction.reference.clone()))
    }

    fn settlement_delay(&self) -> Duration {
        self.settlement_delay
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Native,
    Web,
}

/// Strategy chosen once per platform.
pub enum Confirmation<E, B> {
    Callback(CallbackConfirmation<E>),
    Poll(PollConfirmation<B>),
}

impl<E: EmbeddedCheckout, B: BrowserLauncher> Confirmation<E, B> {
    /// Native builds with a widget use it; everything else goes through the browser.
    pub fn for_platform(
        platform: Platform,
        embedded: Option<E>,
        browser: B,
        settlement_delay: Duration,
    ) -> Self {
        match (platform, embedded) {
            (Platform::Native, Some(widget)) => {
                Confirmation::Callback(CallbackConfirmation::new(widget))
            }
            _ => Confirmation::Poll(PollConfirmation::new(browser, settlement_delay)),
        }
    }
}

#[async_trait]
impl<E: EmbeddedCheckout, B: BrowserLauncher> PaymentConfirmation for Confirmation<E, B> {
    async fn await_confirmation(
        &self,
        transaction: &InitializedTransaction,
    ) -> Result<ConfirmationOutcome, GatewayError> {
        match self {
            Confirmation::Callback(c) => c.await_confirmation(transaction).await,
            Confirmation::Poll(p) => p.await_confirmation(transaction).await,
        }
    }

    fn settlement_delay(&self) -> Duration {
        match self {
            Confirmation::Callback(c) => c.settlement_delay(),
            Confirmation::Poll(p) => p.settlement_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Widget(WidgetResult);

    #[async_trait]
    impl EmbeddedCheckout for Widget {
        async fn present(&self, _: &InitializedTransaction) -> WidgetResult {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct Browser {
        opened: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl BrowserLauncher for Browser {
        async fn open(&self, url: &str) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("no browser");
            }
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn tx() -> InitializedTransaction {
        InitializedTransaction {
            authorization_url: "https://checkout.paystack.com/xyz".into(),
            access_code: "xyz".into(),
            reference: PaymentReference::new("ref_init"),
        }
    }

    #[tokio::test]
    async fn widget_reference_wins_over_initialized_one() {
        let c = CallbackConfirmation::new(Widget(WidgetResult::Success {
            reference: Some(PaymentReference::new("ref_widget")),
        }));
        assert_eq!(
            c.await_confirmation(&tx()).await.unwrap(),
            ConfirmationOutcome::Completed(PaymentReference::new("ref_widget"))
        );
        assert_eq!(c.settlement_delay(), Duration::ZERO);

        let c = CallbackConfirmation::new(Widget(WidgetResult::Success { reference: None }));
        assert_eq!(
            c.await_confirmation(&tx()).await.unwrap(),
            ConfirmationOutcome::Completed(PaymentReference::new("ref_init"))
        );
    }

    #[tokio::test]
    async fn closing_the_widget_cancels() {
        let c = CallbackConfirmation::new(Widget(WidgetResult::Closed));
        assert_eq!(
            c.await_confirmation(&tx()).await.unwrap(),
            ConfirmationOutcome::Cancelled
        );
    }

    #[tokio::test]
    async fn browser_flow_never_reports_cancel() {
        let p = PollConfirmation::new(Browser::default(), Duration::from_millis(10));
        assert_eq!(
            p.await_confirmation(&tx()).await.unwrap(),
            ConfirmationOutcome::Completed(PaymentReference::new("ref_init"))
        );
        assert_eq!(
            p.browser.opened.lock().unwrap().as_slice(),
            ["https://checkout.paystack.com/xyz"]
        );
        assert_eq!(p.settlement_delay(), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn browser_that_cannot_open_is_a_gateway_failure() {
        let p = PollConfirmation::new(
            Browser {
                fail: true,
                ..Browser::default()
            },
            DEFAULT_SETTLEMENT_DELAY,
        );
        let err = p.await_confirmation(&tx()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(m) if m.contains("no browser")));
    }

    #[test]
    fn platform_selects_strategy() {
        let web = Confirmation::for_platform(
            Platform::Web,
            Some(Widget(WidgetResult::Closed)),
            Browser::default(),
            DEFAULT_SETTLEMENT_DELAY,
        );
        assert!(matches!(web, Confirmation::Poll(_)));
        assert_eq!(web.settlement_delay(), DEFAULT_SETTLEMENT_DELAY);

        let native = Confirmation::for_platform(
            Platform::Native,
            Some(Widget(WidgetResult::Closed)),
            Browser::default(),
            DEFAULT_SETTLEMENT_DELAY,
        );
        assert!(matches!(native, Confirmation::Callback(_)));

        let native_without_widget: Confirmation<Widget, Browser> = Confirmation::for_platform(
            Platform::Native,
            None,
            Browser::default(),
            DEFAULT_SETTLEMENT_DELAY,
        );
        assert!(matches!(native_without_widget, Confirmation::Poll(_)));
    }
}
