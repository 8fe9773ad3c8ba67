//! Localized alert messages rendered with minijinja.
//!
//! Each language has four templates: `warning` (80%), `exceeded` (100%),
//! `generic` (any other threshold) and `not_configured`. Templates receive
//! raw numbers and format them through the `millions` and `money` filters.
//!
//! The percentage shown is display-only rounding and plays no part in
//! deciding whether a threshold fired.

use std::sync::OnceLock;

use minijinja::Environment;
use serde::Serialize;
use tracing::warn;

use spendwatch_core::Language;

const CURRENCY_SUFFIX: &str = "đ";

const TEMPLATES: &[(&str, &str)] = &[
    (
        "vi/warning",
        "⚠️ Bạn đã chi tiêu {{ percent }}% ngân sách tháng này ({{ spent | millions }}/{{ budget | millions }})",
    ),
    ("vi/exceeded", "🚨 Bạn đã vượt ngân sách tháng này {{ excess | money }}"),
    ("vi/generic", "Bạn đã sử dụng {{ percent }}% ngân sách tháng này"),
    ("vi/not_configured", "Chưa thiết lập ngân sách tháng này"),
    (
        "en/warning",
        "⚠️ You've spent {{ percent }}% of this month's budget ({{ spent | millions }}/{{ budget | millions }})",
    ),
    ("en/exceeded", "🚨 You've exceeded this month's budget by {{ excess | money }}"),
    ("en/generic", "You've used {{ percent }}% of this month's budget"),
    ("en/not_configured", "Monthly budget not configured"),
];

/// Values exposed to message templates.
#[derive(Debug, Clone, Serialize)]
struct MessageContext {
    percent: i64,
    spent: f64,
    budget: f64,
    excess: f64,
    threshold: u32,
}

/// Renders alert messages. Construct once and reuse.
pub struct MessageFormatter {
    env: Environment<'static>,
}

impl MessageFormatter {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_filter("millions", millions);
        env.add_filter("money", money);
        for &(name, source) in TEMPLATES {
            if let Err(e) = env.add_template(name, source) {
                warn!(template = %name, error = %e, "Failed to register message template");
            }
        }
        Self { env }
    }

    /// Message for `spent` against `budget_amount` at `threshold` percent.
    /// Never fails: a broken template degrades to a plain-text message.
    pub fn format(&self, spent: f64, budget_amount: f64, threshold: u32, language: Language) -> String {
        let lang = language.code();

        if !(budget_amount > 0.0) {
            return self
                .render(&format!("{lang}/not_configured"), &MessageContext::empty(threshold))
                .unwrap_or_else(|| fallback_not_configured(language).to_string());
        }

        let spent = if spent.is_finite() { spent } else { 0.0 };
        let ctx = MessageContext {
            percent: display_percent(spent, budget_amount),
            spent,
            budget: budget_amount,
            excess: (spent - budget_amount).max(0.0),
            threshold,
        };

        let kind = match threshold {
            80 => "warning",
            100 => "exceeded",
            _ => "generic",
        };
        self.render(&format!("{lang}/{kind}"), &ctx)
            .unwrap_or_else(|| fallback_generic(language, ctx.percent))
    }

    fn render(&self, name: &str, ctx: &MessageContext) -> Option<String> {
        let rendered = self
            .env
            .get_template(name)
            .and_then(|template| template.render(ctx));
        match rendered {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(template = %name, error = %e, "Message template rendering failed");
                None
            }
        }
    }
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageContext {
    fn empty(threshold: u32) -> Self {
        Self {
            percent: 0,
            spent: 0.0,
            budget: 0.0,
            excess: 0.0,
            threshold,
        }
    }
}

/// Format an alert message for a language code. Unsupported codes use the
/// default language.
pub fn format_message(spent: f64, budget_amount: f64, threshold: u32, language: &str) -> String {
    static FORMATTER: OnceLock<MessageFormatter> = OnceLock::new();
    FORMATTER
        .get_or_init(MessageFormatter::new)
        .format(spent, budget_amount, threshold, Language::from_code(language))
}

fn display_percent(spent: f64, budget_amount: f64) -> i64 {
    (spent / budget_amount * 100.0).round() as i64
}

fn fallback_not_configured(language: Language) -> &'static str {
    match language {
        Language::Vi => "Chưa thiết lập ngân sách tháng này",
        Language::En => "Monthly budget not configured",
    }
}

fn fallback_generic(language: Language, percent: i64) -> String {
    match language {
        Language::Vi => format!("Bạn đã sử dụng {percent}% ngân sách tháng này"),
        Language::En => format!("You've used {percent}% of this month's budget"),
    }
}

// ── Filters ─────────────────────────────────────────────────────────

/// Abbreviated millions: `12M` for whole millions, `12.5M` otherwise.
/// Rounds to one decimal first, so 12.96M prints as `13M`.
fn millions(value: f64) -> String {
    if !value.is_finite() {
        return "0M".to_string();
    }
    let tenths = (value / 100_000.0).round();
    if tenths % 10.0 == 0.0 {
        format!("{}M", (tenths / 10.0) as i64)
    } else {
        format!("{:.1}M", tenths / 10.0)
    }
}

/// Whole currency units with thousands separators and the currency suffix.
/// Negative and non-finite amounts render as zero.
fn money(value: f64) -> String {
    let units = if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    };
    format!("{}{}", group_thousands(units), CURRENCY_SUFFIX)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
