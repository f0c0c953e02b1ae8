//! The registration transition function.
//!
//! Each inbound event maps to a single atomic step: the record is mutated and
//! the outbound messages for the resulting state are returned together, so the
//! transition table is testable without a transport.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::channel::{Outbound, SenderIdentity};
use crate::registration::lexicon::{self, Reply};
use crate::registration::model::{UserRegistration, title_case};
use crate::registration::prompts::Prompts;
use crate::registration::signin::{self, SigninLinks};
use crate::registration::state::RegistrationState;

/// Shared read-only context for transitions.
#[derive(Debug, Clone, Copy)]
pub struct MachineCtx<'a> {
    pub prompts: &'a Prompts,
    pub links: &'a SigninLinks,
}

/// Result of one transition.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    /// Zero or more messages to send, in order.
    pub messages: Vec<Outbound>,
    /// True when a fresh sign-in link is among the messages. The issuance
    /// timestamp is only confirmed after the link actually sends.
    pub signin_issued: bool,
}

impl Outcome {
    fn message(message: Outbound) -> Self {
        Self {
            messages: vec![message],
            signin_issued: false,
        }
    }
}

/// Advance the record's state, checking the transition table in debug builds.
fn move_to(record: &mut UserRegistration, target: RegistrationState) {
    debug_assert!(
        record.state.can_transition_to(target),
        "invalid transition {} -> {target}",
        record.state
    );
    record.state = target;
}

/// Apply a free-text reply to the user's current state.
pub fn handle_text(
    record: &mut UserRegistration,
    sender: &SenderIdentity,
    text: &str,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
    ctx: MachineCtx<'_>,
) -> Outcome {
    match record.state {
        RegistrationState::ConfirmFullName => match lexicon::classify(text) {
            Reply::Affirmative => {
                record.display_name = sender.full_name();
                move_to(record, RegistrationState::AskTos);
                Outcome::message(prompt_for(record, sender, ctx))
            }
            Reply::Negative => {
                move_to(record, RegistrationState::AskFullName);
                Outcome::message(prompt_for(record, sender, ctx))
            }
            Reply::Other => Outcome::message(prompt_for(record, sender, ctx)),
        },
        RegistrationState::AskFullName => {
            // Any text is the entered name, but a name must survive
            // trimming: display_name stays non-empty from AskTos onward.
            let name = title_case(text);
            if name.is_empty() {
                return Outcome::message(prompt_for(record, sender, ctx));
            }
            record.display_name = name;
            move_to(record, RegistrationState::AskTos);
            Outcome::message(prompt_for(record, sender, ctx))
        }
        RegistrationState::AskTos => match lexicon::classify(text) {
            Reply::Affirmative => {
                record.tos_agreed = true;
                move_to(record, RegistrationState::AskSubscription);
                Outcome::message(prompt_for(record, sender, ctx))
            }
            // ToS is not optional; anything else re-asks.
            _ => Outcome::message(prompt_for(record, sender, ctx)),
        },
        RegistrationState::AskSubscription => match lexicon::classify(text) {
            Reply::Affirmative => {
                record.subscription_opt_in = true;
                move_to(record, RegistrationState::CreateAccount);
                Outcome::message(prompt_for(record, sender, ctx))
            }
            Reply::Negative => {
                // Declining updates is a valid choice, not a re-prompt.
                record.subscription_opt_in = false;
                move_to(record, RegistrationState::CreateAccount);
                Outcome::message(prompt_for(record, sender, ctx))
            }
            Reply::Other => Outcome::message(prompt_for(record, sender, ctx)),
        },
        RegistrationState::CreateAccount => match lexicon::classify(text) {
            Reply::Affirmative => {
                move_to(record, RegistrationState::Done);
                issue_signin(record, sender, now, rng, ctx)
            }
            Reply::Negative => {
                move_to(record, RegistrationState::Done);
                Outcome::message(Outbound::RemoveKeyboard(ctx.prompts.closing()))
            }
            // Ambiguous text re-asks rather than silently declining sign-in.
            Reply::Other => Outcome::message(prompt_for(record, sender, ctx)),
        },
        RegistrationState::Done => Outcome::message(Outbound::Text(ctx.prompts.signin_reminder())),
    }
}

/// Command entry point (`/start`, `/signin`): re-emit the prompt for the
/// user's current state. Never a reset — a user mid-flow resumes their step;
/// a finished user gets a sign-in link.
pub fn advance(
    record: &mut UserRegistration,
    sender: &SenderIdentity,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
    ctx: MachineCtx<'_>,
) -> Outcome {
    if record.state.is_terminal() {
        return issue_signin(record, sender, now, rng, ctx);
    }
    Outcome::message(prompt_for(record, sender, ctx))
}

/// The prompt emitted when (re)entering a non-terminal state.
fn prompt_for(record: &UserRegistration, sender: &SenderIdentity, ctx: MachineCtx<'_>) -> Outbound {
    match record.state {
        RegistrationState::ConfirmFullName => Outbound::YesNo(
            ctx.prompts
                .confirm_display_name(&record.full_name(sender)),
        ),
        RegistrationState::AskFullName => {
            Outbound::RemoveKeyboard(ctx.prompts.ask_display_name())
        }
        RegistrationState::AskTos => Outbound::YesNo(ctx.prompts.ask_tos()),
        RegistrationState::AskSubscription => Outbound::YesNo(ctx.prompts.ask_subscription()),
        RegistrationState::CreateAccount => Outbound::YesNo(ctx.prompts.account_created(record)),
        RegistrationState::Done => Outbound::Text(ctx.prompts.signin_reminder()),
    }
}

/// Issue a sign-in link, or a "still valid" notice inside the cooldown.
///
/// Does not touch `last_signin_request`; the caller confirms the timestamp
/// after the link sends successfully, so a transport failure leaves the user
/// immediately eligible to retry.
fn issue_signin(
    record: &UserRegistration,
    sender: &SenderIdentity,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
    ctx: MachineCtx<'_>,
) -> Outcome {
    if signin::cooldown_active(record.last_signin_request, now) {
        return Outcome::message(Outbound::Text(ctx.prompts.signin_still_valid()));
    }

    let code = signin::signin_code(rng);
    let url = ctx.links.signin_url(&code, sender.user_id);
    Outcome {
        messages: vec![Outbound::RemoveKeyboard(
            ctx.prompts.signin_link(&record.full_name(sender), &url),
        )],
        signin_issued: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sender() -> SenderIdentity {
        SenderIdentity {
            user_id: 42,
            chat_id: 42,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }
    }

    fn prompts() -> Prompts {
        Prompts::new("Kyber Network", "https://home.kyber.network/assets/tac.pdf")
    }

    fn run_text(record: &mut UserRegistration, text: &str) -> Outcome {
        let prompts = prompts();
        let links = SigninLinks::new("https://kyber.network");
        let ctx = MachineCtx {
            prompts: &prompts,
            links: &links,
        };
        let mut rng = StdRng::seed_from_u64(1);
        handle_text(record, &sender(), text, Utc::now(), &mut rng, ctx)
    }

    fn run_advance(record: &mut UserRegistration, now: DateTime<Utc>) -> Outcome {
        let prompts = prompts();
        let links = SigninLinks::new("https://kyber.network");
        let ctx = MachineCtx {
            prompts: &prompts,
            links: &links,
        };
        let mut rng = StdRng::seed_from_u64(1);
        advance(record, &sender(), now, &mut rng, ctx)
    }

    #[test]
    fn confirm_yes_takes_platform_name() {
        let mut record = UserRegistration::default();
        let outcome = run_text(&mut record, "yes");
        assert_eq!(record.state, RegistrationState::AskTos);
        assert_eq!(record.display_name, "Ada Lovelace");
        assert!(matches!(outcome.messages[0], Outbound::YesNo(_)));
    }

    #[test]
    fn confirm_no_asks_for_typed_name() {
        let mut record = UserRegistration::default();
        let outcome = run_text(&mut record, "no");
        assert_eq!(record.state, RegistrationState::AskFullName);
        assert!(record.display_name.is_empty());
        assert!(matches!(outcome.messages[0], Outbound::RemoveKeyboard(_)));
    }

    #[test]
    fn confirm_ambiguous_reprompts() {
        let mut record = UserRegistration::default();
        let outcome = run_text(&mut record, "maybe?");
        assert_eq!(record.state, RegistrationState::ConfirmFullName);
        let Outbound::YesNo(text) = &outcome.messages[0] else {
            panic!("expected Yes/No prompt");
        };
        assert!(text.contains("Ada Lovelace"));
    }

    #[test]
    fn typed_name_is_title_cased_and_trimmed() {
        let mut record = UserRegistration {
            state: RegistrationState::AskFullName,
            ..Default::default()
        };
        run_text(&mut record, "  john smith ");
        assert_eq!(record.display_name, "John Smith");
        assert_eq!(record.state, RegistrationState::AskTos);
    }

    #[test]
    fn whitespace_only_name_reasks_without_advancing() {
        let mut record = UserRegistration {
            state: RegistrationState::AskFullName,
            ..Default::default()
        };
        let outcome = run_text(&mut record, "   ");
        assert_eq!(record.state, RegistrationState::AskFullName);
        assert!(record.display_name.is_empty());
        let Outbound::RemoveKeyboard(text) = &outcome.messages[0] else {
            panic!("expected the name prompt again");
        };
        assert!(text.contains("display name"));
    }

    #[test]
    fn tos_rejection_reprompts() {
        let mut record = UserRegistration {
            state: RegistrationState::AskTos,
            ..Default::default()
        };
        run_text(&mut record, "no");
        assert_eq!(record.state, RegistrationState::AskTos);
        assert!(!record.tos_agreed);

        run_text(&mut record, "hmm");
        assert_eq!(record.state, RegistrationState::AskTos);
    }

    #[test]
    fn tos_agreement_advances() {
        let mut record = UserRegistration {
            state: RegistrationState::AskTos,
            ..Default::default()
        };
        run_text(&mut record, "ok");
        assert!(record.tos_agreed);
        assert_eq!(record.state, RegistrationState::AskSubscription);
    }

    #[test]
    fn subscription_no_still_advances() {
        let mut record = UserRegistration {
            state: RegistrationState::AskSubscription,
            display_name: "John Smith".into(),
            tos_agreed: true,
            ..Default::default()
        };
        let outcome = run_text(&mut record, "no");
        assert!(!record.subscription_opt_in);
        assert_eq!(record.state, RegistrationState::CreateAccount);
        // Entering CreateAccount shows the summary.
        assert!(outcome.messages[0].text().contains("Display Name: John Smith"));
    }

    #[test]
    fn subscription_yes_opts_in() {
        let mut record = UserRegistration {
            state: RegistrationState::AskSubscription,
            display_name: "John Smith".into(),
            tos_agreed: true,
            ..Default::default()
        };
        run_text(&mut record, "absolutely");
        assert!(record.subscription_opt_in);
        assert_eq!(record.state, RegistrationState::CreateAccount);
    }

    #[test]
    fn create_account_yes_issues_signin_link() {
        let mut record = UserRegistration {
            state: RegistrationState::CreateAccount,
            display_name: "Ada Lovelace".into(),
            tos_agreed: true,
            ..Default::default()
        };
        let outcome = run_text(&mut record, "yes");
        assert_eq!(record.state, RegistrationState::Done);
        assert!(outcome.signin_issued);
        let text = outcome.messages[0].text();
        assert!(text.contains("https://kyber.network/signin?code="));
        assert!(text.contains("&account=42"));
    }

    #[test]
    fn create_account_no_sends_closing() {
        let mut record = UserRegistration {
            state: RegistrationState::CreateAccount,
            ..Default::default()
        };
        let outcome = run_text(&mut record, "no");
        assert_eq!(record.state, RegistrationState::Done);
        assert!(!outcome.signin_issued);
        assert!(outcome.messages[0].text().contains("/signin"));
    }

    #[test]
    fn create_account_ambiguous_reprompts() {
        let mut record = UserRegistration {
            state: RegistrationState::CreateAccount,
            display_name: "Ada Lovelace".into(),
            ..Default::default()
        };
        let outcome = run_text(&mut record, "what does that mean");
        assert_eq!(record.state, RegistrationState::CreateAccount);
        assert!(!outcome.signin_issued);
        assert!(matches!(outcome.messages[0], Outbound::YesNo(_)));
    }

    #[test]
    fn done_text_reminds_signin() {
        let mut record = UserRegistration {
            state: RegistrationState::Done,
            display_name: "Ada".into(),
            tos_agreed: true,
            ..Default::default()
        };
        let outcome = run_text(&mut record, "hello?");
        assert!(outcome.messages[0].text().contains("/signin"));
        // Nothing resets.
        assert_eq!(record.display_name, "Ada");
        assert!(record.tos_agreed);
    }

    #[test]
    fn advance_mid_flow_resumes_current_prompt() {
        let mut record = UserRegistration {
            state: RegistrationState::AskTos,
            display_name: "Ada".into(),
            ..Default::default()
        };
        let outcome = run_advance(&mut record, Utc::now());
        assert_eq!(record.state, RegistrationState::AskTos);
        assert!(outcome.messages[0].text().contains("Term of Service"));
    }

    #[test]
    fn advance_at_done_issues_link() {
        let mut record = UserRegistration {
            state: RegistrationState::Done,
            display_name: "Ada".into(),
            ..Default::default()
        };
        let outcome = run_advance(&mut record, Utc::now());
        assert!(outcome.signin_issued);
    }

    #[test]
    fn signin_inside_cooldown_gets_still_valid_notice() {
        let now = Utc::now();
        let mut record = UserRegistration {
            state: RegistrationState::Done,
            last_signin_request: Some(now - Duration::seconds(10)),
            ..Default::default()
        };
        let outcome = run_advance(&mut record, now);
        assert!(!outcome.signin_issued);
        assert!(outcome.messages[0].text().contains("still valid"));
        // Timestamp untouched.
        assert_eq!(record.last_signin_request, Some(now - Duration::seconds(10)));
    }

    #[test]
    fn signin_after_cooldown_issues_again() {
        let now = Utc::now();
        let mut record = UserRegistration {
            state: RegistrationState::Done,
            last_signin_request: Some(now - Duration::seconds(120)),
            ..Default::default()
        };
        let outcome = run_advance(&mut record, now);
        assert!(outcome.signin_issued);
    }
}
