pub mod auth_service;
pub use auth_service::{AuthError, AuthService, Provisioned};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod email;
pub use email::{EmailKind, MailError, Mailer, OutboundEmail};

pub mod newsletter;
pub use newsletter::{DispatchReport, NewsletterDispatcher, NewsletterError, NewsletterRequest};

pub mod outbox;
pub use outbox::{Outbox, RetryPolicy};

pub mod password;

pub mod seed;
pub use seed::seed_demo_content;

pub mod subscriber_service;
pub use subscriber_service::{SubscribeOutcome, SubscriberError, SubscriberService};

pub mod subscriber_service_impl;
pub use subscriber_service_impl::SeaOrmSubscriberService;
