use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::dedup::sms_hash;
use crate::models::{
    CustomSmsRule, IgnoreRule, IgnoreRuleType, PotentialAccount, PotentialTransaction, SmsMessage,
    TransactionType,
};

/// User-editable inputs to [`parse`], loaded from storage by `rules::load_parse_rules`.
#[derive(Debug, Clone, Default)]
pub struct ParseRules {
    /// Highest priority first.
    pub custom: Vec<CustomSmsRule>,
    /// Only enabled rules are consulted.
    pub ignore: Vec<IgnoreRule>,
    /// Parsed merchant name -> preferred name.
    pub renames: HashMap<String, String>,
}

const CURRENCY_CODES: &str =
    "inr|usd|eur|gbp|aed|sgd|myr|thb|jpy|aud|cad|chf|cny|hkd|lkr|npr|sar|qar|omr|kwd|bhd|idr|php|nzd|zar";

fn currency_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)\b(rs\.?|{CURRENCY_CODES})\s*(\d[\d,]*(?:\.\d+)?)"))
            .expect("invalid currency amount regex")
    })
}

fn keyword_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:purchase of|payment of|spent|charged|credited with|debited for|credit of|for)\s+(\d[\d,]*(?:\.\d+)?)",
        )
        .expect("invalid keyword amount regex")
    })
}

fn expense_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(spent|debited|paid|charged|payment of|purchase of)\b")
            .expect("invalid expense keyword regex")
    })
}

fn income_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(credited|received|deposited|refund of)\b").expect("invalid income keyword regex")
    })
}

fn phone_like_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{6,}").expect("invalid phone regex"))
}

// Tried in order; the first acceptable capture wins.
fn merchant_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?:credited|received).*from\s+([A-Za-z0-9\s.&'-]+?)(?:\.|$)",
            r"at\s*\.\.\s*([A-Za-z0-9_\s]+)\s*on",
            r";\s*([A-Za-z0-9\s.&'-]+?)\s*credited",
            r"UPI.*(?:to|\bat\b)\s+([A-Za-z0-9\s.&'()]+?)(?:\s+on|\s+Ref|$)",
            r"to\s+([a-zA-Z0-9.\-_]+@[a-zA-Z0-9]+)",
            r"(?:\bat\b|to\s+)([A-Za-z0-9\s.&'-]+?)(?:\s+on\s+|\s+for\s+|\.|$|\s+was\s+)",
            r"Info:?\s*([A-Za-z0-9\s.&'-]+?)(?:\.|$)",
        ]
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .expect("invalid merchant regex")
        })
        .collect()
    })
}

#[derive(Clone, Copy)]
enum AccountShape {
    /// groups: bank, digits
    BankDigits(&'static str),
    /// groups: digits, bank
    DigitsBank(&'static str),
    /// groups: bank, account type, digits
    BankTypeDigits,
    /// groups: bank
    BankOnly(&'static str),
}

fn account_res() -> &'static [(Regex, AccountShape)] {
    static RES: OnceLock<Vec<(Regex, AccountShape)>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            (r"(ICICI Bank) Account XX(\d{3,4}) credited", AccountShape::BankDigits("Bank Account")),
            (r"(HDFC Bank) : NEFT money transfer", AccountShape::BankOnly("Bank Account")),
            (
                r"spent from (Pluxee)\s*(Meal Card wallet), card no\.\s*xx(\d{4})",
                AccountShape::BankTypeDigits,
            ),
            (r"on your (SBI) (Credit Card) ending with (\d{4})", AccountShape::BankTypeDigits),
            (r"On (HDFC Bank) (Card) (\d{4})", AccountShape::BankTypeDigits),
            (r"(ICICI Bank) Acct XX(\d{3,4}) debited", AccountShape::BankDigits("Savings Account")),
            (r"Acct XX(\d{3,4}) is credited.*-(ICICI Bank)", AccountShape::DigitsBank("Savings Account")),
        ]
        .iter()
        .map(|(p, shape)| {
            let re = RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .expect("invalid account regex");
            (re, *shape)
        })
        .collect()
    })
}

fn compile_user_regex(pattern: &str, case_insensitive: bool) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(case_insensitive).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "skipping invalid rule regex");
            None
        }
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").trim().parse().ok()
}

fn normalize_currency(prefix: &str) -> String {
    let upper = prefix.trim_end_matches('.').to_uppercase();
    if upper == "RS" {
        "INR".to_string()
    } else {
        upper
    }
}

fn is_ignored(sms: &SmsMessage, rules: &[IgnoreRule]) -> bool {
    rules.iter().filter(|r| r.is_enabled).any(|rule| {
        let haystack = match rule.rule_type {
            IgnoreRuleType::Sender => &sms.sender,
            IgnoreRuleType::BodyPhrase => &sms.body,
        };
        match compile_user_regex(&rule.pattern, true) {
            Some(re) => re.is_match(haystack),
            None => haystack.to_lowercase().contains(&rule.pattern.to_lowercase()),
        }
    })
}

struct RuleCaptures {
    merchant: Option<String>,
    amount: Option<f64>,
    account: Option<String>,
}

fn apply_custom_rules(body: &str, rules: &[CustomSmsRule]) -> Option<RuleCaptures> {
    let lower = body.to_lowercase();
    let rule = rules
        .iter()
        .find(|r| !r.trigger_phrase.is_empty() && lower.contains(&r.trigger_phrase.to_lowercase()))?;
    tracing::debug!(rule_id = rule.id, trigger = %rule.trigger_phrase, "custom rule triggered");

    let capture = |pattern: &Option<String>| {
        pattern
            .as_deref()
            .and_then(|p| compile_user_regex(p, false))
            .and_then(|re| first_capture(&re, body))
            .filter(|s| !s.is_empty())
    };

    Some(RuleCaptures {
        merchant: capture(&rule.merchant_regex),
        amount: capture(&rule.amount_regex).and_then(|s| parse_number(&s)),
        account: capture(&rule.account_regex),
    })
}

fn clean_merchant(raw: &str) -> String {
    raw.replace('_', " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn acceptable_merchant(name: &str) -> bool {
    if name.is_empty() || name.to_lowercase().contains("call") {
        return false;
    }
    name.to_uppercase().starts_with("NEFT") || !phone_like_re().is_match(name)
}

fn extract_merchant(body: &str) -> Option<String> {
    merchant_res().iter().find_map(|re| {
        let candidate = clean_merchant(re.captures(body)?.get(1)?.as_str());
        acceptable_merchant(&candidate).then_some(candidate)
    })
}

pub fn extract_account(body: &str) -> Option<PotentialAccount> {
    account_res().iter().find_map(|(re, shape)| {
        let caps = re.captures(body)?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
        let account = match *shape {
            AccountShape::BankDigits(kind) => PotentialAccount {
                formatted_name: format!("{} - xx{}", group(1), group(2)),
                account_type: kind.to_string(),
            },
            AccountShape::DigitsBank(kind) => PotentialAccount {
                formatted_name: format!("{} - xx{}", group(2), group(1)),
                account_type: kind.to_string(),
            },
            AccountShape::BankTypeDigits => PotentialAccount {
                formatted_name: format!("{} - xx{}", group(1), group(3)),
                account_type: group(2),
            },
            AccountShape::BankOnly(kind) => PotentialAccount {
                formatted_name: group(1),
                account_type: kind.to_string(),
            },
        };
        Some(account)
    })
}

/// Turns one SMS into a candidate transaction, or `None` when the message is
/// ignored, carries no amount, or has no debit/credit wording.
///
/// `mappings` is keyed by exact sender; a mapped name is final and skips
/// rename rules.
pub fn parse(
    sms: &SmsMessage,
    mappings: &HashMap<String, String>,
    rules: &ParseRules,
) -> Option<PotentialTransaction> {
    let body = sms.body.as_str();
    tracing::debug!(sender = %sms.sender, sms_id = sms.id, "parsing sms");

    if is_ignored(sms, &rules.ignore) {
        tracing::debug!(sms_id = sms.id, "matched an ignore rule");
        return None;
    }

    let custom = apply_custom_rules(body, &rules.custom);
    let custom_amount = custom.as_ref().and_then(|c| c.amount);

    let (amount, currency) = match custom_amount {
        Some(amount) => (amount, None),
        None => {
            if let Some(caps) = currency_amount_re().captures(body) {
                (parse_number(&caps[2])?, Some(normalize_currency(&caps[1])))
            } else {
                let caps = keyword_amount_re().captures(body)?;
                (parse_number(&caps[1])?, None)
            }
        }
    };
    if !amount.is_finite() || amount <= 0.0 {
        tracing::debug!(sms_id = sms.id, amount, "unusable amount");
        return None;
    }

    let transaction_type = if expense_re().is_match(body) {
        TransactionType::Expense
    } else if income_re().is_match(body) {
        TransactionType::Income
    } else {
        tracing::debug!(sms_id = sms.id, "no debit or credit keyword");
        return None;
    };

    let merchant_name = match mappings.get(&sms.sender) {
        Some(mapped) => Some(mapped.clone()),
        None => custom
            .as_ref()
            .and_then(|c| c.merchant.clone())
            .or_else(|| extract_merchant(body))
            .map(|name| rules.renames.get(&name).cloned().unwrap_or(name)),
    };

    let potential_account = custom
        .as_ref()
        .and_then(|c| c.account.as_ref())
        .map(|name| PotentialAccount {
            formatted_name: name.clone(),
            account_type: "Bank Account".to_string(),
        })
        .or_else(|| extract_account(body));

    Some(PotentialTransaction {
        source_sms_id: sms.id,
        sms_sender: sms.sender.clone(),
        sms_date: sms.date,
        amount,
        transaction_type,
        merchant_name,
        original_message: sms.body.clone(),
        potential_account,
        source_sms_hash: sms_hash(&sms.sender, &sms.body),
        detected_currency_code: currency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DEFAULT_IGNORE_PHRASES;

    fn sms(id: i64, sender: &str, body: &str) -> SmsMessage {
        SmsMessage {
            id,
            sender: sender.to_string(),
            body: body.to_string(),
            date: 1_750_000_000_000,
        }
    }

    fn ignore(pattern: &str) -> IgnoreRule {
        IgnoreRule {
            id: 0,
            rule_type: IgnoreRuleType::BodyPhrase,
            pattern: pattern.to_string(),
            is_enabled: true,
            is_default: false,
        }
    }

    fn default_rules() -> ParseRules {
        ParseRules {
            ignore: DEFAULT_IGNORE_PHRASES.iter().map(|p| ignore(p)).collect(),
            ..Default::default()
        }
    }

    fn run(sender: &str, body: &str) -> Option<PotentialTransaction> {
        parse(&sms(1, sender, body), &HashMap::new(), &default_rules())
    }

    fn account(result: &PotentialTransaction) -> (&str, &str) {
        let acc = result.potential_account.as_ref().unwrap();
        (acc.formatted_name.as_str(), acc.account_type.as_str())
    }

    #[test]
    fn test_foreign_currency_code() {
        let r = run("AM-HDFCBK", "You have spent MYR 55.50 at STARBUCKS.").unwrap();
        assert_eq!(r.amount, 55.50);
        assert_eq!(r.transaction_type, TransactionType::Expense);
        assert_eq!(r.merchant_name.as_deref(), Some("STARBUCKS"));
        assert_eq!(r.detected_currency_code.as_deref(), Some("MYR"));
    }

    #[test]
    fn test_home_currency_code_and_symbol() {
        let r = run("AM-HDFCBK", "You have spent INR 120.00 at CCD.").unwrap();
        assert_eq!(r.amount, 120.0);
        assert_eq!(r.detected_currency_code.as_deref(), Some("INR"));

        let r = run("AM-HDFCBK", "You have spent Rs. 300 at a local store.").unwrap();
        assert_eq!(r.amount, 300.0);
        assert_eq!(r.detected_currency_code.as_deref(), Some("INR"));
    }

    #[test]
    fn test_keyword_amount_has_no_currency() {
        let r = run("AM-HDFCBK", "A purchase of 500.00 was made at some store.").unwrap();
        assert_eq!(r.amount, 500.0);
        assert_eq!(r.detected_currency_code, None);
        assert_eq!(r.merchant_name.as_deref(), Some("some store"));
    }

    #[test]
    fn test_debit_message() {
        let r = run(
            "AM-HDFCBK",
            "Your account with HDFC Bank has been debited for Rs. 750.50 at Amazon on 22-Jun-2025.",
        )
        .unwrap();
        assert_eq!(r.amount, 750.50);
        assert_eq!(r.transaction_type, TransactionType::Expense);
        assert_eq!(r.merchant_name.as_deref(), Some("Amazon"));
    }

    #[test]
    fn test_credit_message() {
        let r = run("DM-SOMEBK", "You have received a credit of INR 5,000.00 from Freelance Client.").unwrap();
        assert_eq!(r.amount, 5000.0);
        assert_eq!(r.transaction_type, TransactionType::Income);
        assert_eq!(r.merchant_name.as_deref(), Some("Freelance Client"));
    }

    #[test]
    fn test_zero_or_overflowing_amount_is_skipped() {
        assert!(run("VM-SHOP", "Rs 0.00 debited from your account at Shop.").is_none());
        assert!(run("VM-SHOP", "You have spent INR 0 at CCD.").is_none());

        let huge = "9".repeat(400);
        assert!(run("VM-SHOP", &format!("You have spent INR {huge} at CCD.")).is_none());
    }

    #[test]
    fn test_non_financial_message() {
        assert!(run(
            "+1234567890",
            "Hello, just checking in. Are we still on for dinner tomorrow evening?"
        )
        .is_none());
    }

    #[test]
    fn test_sbi_credit_card() {
        let r = run(
            "VM-SBICRD",
            "Rs.267.00 spent on your SBI Credit Card ending with 3201 at HALLI THOTA on 29-06-25 via UPI \
             (Ref No. 1231230123). Trxn. Not done by you? Report at [https://sbicards.com/Dispute](https://sbicards.com/Dispute))",
        )
        .unwrap();
        assert_eq!(r.amount, 267.0);
        assert_eq!(r.transaction_type, TransactionType::Expense);
        assert_eq!(r.merchant_name.as_deref(), Some("HALLI THOTA"));
        assert_eq!(account(&r), ("SBI - xx3201", "Credit Card"));
    }

    #[test]
    fn test_icici_debit() {
        let r = run(
            "DM-ICIBNK",
            "ICICI Bank Acct XX823 debited for Rs 240.00 on 28-Jul-25; DAKSHIN CAFE credited. UPI: 552200221100. \
             Call 18002661 for dispute. SMS BLOCK 823 to 123123123",
        )
        .unwrap();
        assert_eq!(r.amount, 240.0);
        assert_eq!(r.detected_currency_code.as_deref(), Some("INR"));
        assert_eq!(r.transaction_type, TransactionType::Expense);
        assert_eq!(r.merchant_name.as_deref(), Some("DAKSHIN CAFE"));
        assert_eq!(account(&r), ("ICICI Bank - xx823", "Savings Account"));
    }

    #[test]
    fn test_hdfc_card() {
        let r = run(
            "JD-HDFCBK",
            "[JD-HDFCBK-S] Spent Rs.388.19 On HDFC Bank Card 9922 At ..MC DONALDS_ on2025-06-22:08:01:24.Not You> \
             To Block+Reissue Call 18002323232/SMS BLOCK CC 9922 to 123098123",
        )
        .unwrap();
        assert_eq!(r.amount, 388.19);
        assert_eq!(r.merchant_name.as_deref(), Some("MC DONALDS"));
        assert_eq!(account(&r), ("HDFC Bank - xx9922", "Card"));
    }

    #[test]
    fn test_pluxee_meal_card() {
        let r = run(
            "VD-PLUXEE",
            "Rs. 60.00 spent from Pluxee Meal Card wallet, card no.xx1345 on 30-06-2025 18:41:56 at KITCHEN AFF . \
             Avl bal Rs.1824.65. Not you call 18002106919",
        )
        .unwrap();
        assert_eq!(r.amount, 60.0);
        assert_eq!(r.merchant_name.as_deref(), Some("KITCHEN AFF"));
        assert_eq!(account(&r), ("Pluxee - xx1345", "Meal Card wallet"));
    }

    #[test]
    fn test_icici_credit_with_bank_suffix() {
        let r = run(
            "QP-ICIBNK",
            "Dear Customer, Acct XX823 is credited with Rs 6000.00 on 26-Jun-25 from GANGA MANGA. UPI:5577822323232-ICICI Bank",
        )
        .unwrap();
        assert_eq!(r.amount, 6000.0);
        assert_eq!(r.transaction_type, TransactionType::Income);
        assert_eq!(r.merchant_name.as_deref(), Some("GANGA MANGA"));
        assert_eq!(account(&r), ("ICICI Bank - xx823", "Savings Account"));
    }

    #[test]
    fn test_icici_neft_credit_keeps_reference() {
        let r = run(
            "VM-ICIBNK",
            "ICICI Bank Account XX823 credited:Rs. 1,133.00 on 01-Jul-25. Info NEFT-HDFCN5202507024345356218-. \
             Available Balance is Rs. 1,858.35.",
        )
        .unwrap();
        assert_eq!(r.amount, 1133.0);
        assert_eq!(r.transaction_type, TransactionType::Income);
        assert_eq!(r.merchant_name.as_deref(), Some("NEFT-HDFCN5202507024345356218-"));
        assert_eq!(account(&r), ("ICICI Bank - xx823", "Bank Account"));
    }

    #[test]
    fn test_default_ignore_phrases() {
        for (sender, body) in [
            ("VM-NBHOOD", "Your payment of Rs.330.80 for A4-108 against Water Charges is successful. Regards NoBrokerHood"),
            (
                "VM-HDFCBK",
                "HDFC Bank : NEFT money transfer Txn No HDFCN520253454560344 for Rs INR 1,500.00 has been credited to Manga Penga on 01-07-2025 at 08:05:30",
            ),
            ("DM-SBICRD", "Payment of INR 1180.01 has been received towards your SBI card XX1121"),
            (
                "DM-ICIBNK",
                "Payment of Rs 356.33 has been received on your ICICI Bank Credit Card XX2529 through Bharat Bill Payment System on 03-JUL-25.",
            ),
            ("VM-NBHOOD", "An Invoice of Rs.330.8 for A4 Block-108 is raised."),
        ] {
            assert!(run(sender, body).is_none(), "should be ignored: {body}");
        }
    }

    #[test]
    fn test_disabled_ignore_rule_is_skipped() {
        let mut rule = ignore("invoice of");
        rule.is_enabled = false;
        let rules = ParseRules {
            ignore: vec![rule],
            ..Default::default()
        };
        let r = parse(&sms(1, "VM-X", "Invoice of Rs 10 paid"), &HashMap::new(), &rules);
        assert!(r.is_some());
    }

    #[test]
    fn test_sender_ignore_rule() {
        let rules = ParseRules {
            ignore: vec![IgnoreRule {
                rule_type: IgnoreRuleType::Sender,
                ..ignore("promo")
            }],
            ..Default::default()
        };
        assert!(parse(&sms(1, "VM-PROMO", "You spent Rs 10 at Cafe."), &HashMap::new(), &rules).is_none());
        assert!(parse(&sms(1, "VM-HDFCBK", "You spent Rs 10 at Cafe."), &HashMap::new(), &rules).is_some());
    }

    #[test]
    fn test_invalid_ignore_pattern_falls_back_to_substring() {
        let rules = ParseRules {
            ignore: vec![ignore("otp (")],
            ..Default::default()
        };
        assert!(parse(&sms(1, "VM-X", "Your OTP (do not share) for Rs 10 spent"), &HashMap::new(), &rules).is_none());
    }

    #[test]
    fn test_mapping_wins_over_everything() {
        let mut mappings = HashMap::new();
        mappings.insert("AM-HDFCBK".to_string(), "Coffee Day".to_string());
        let rules = ParseRules {
            custom: vec![CustomSmsRule {
                id: 1,
                trigger_phrase: "spent".to_string(),
                merchant_regex: Some(r"at (\w+)".to_string()),
                amount_regex: None,
                account_regex: None,
                priority: 10,
            }],
            renames: HashMap::from([("Coffee Day".to_string(), "CCD".to_string())]),
            ..Default::default()
        };
        let r = parse(&sms(1, "AM-HDFCBK", "You have spent INR 120.00 at CCD."), &mappings, &rules).unwrap();
        assert_eq!(r.merchant_name.as_deref(), Some("Coffee Day"));
    }

    #[test]
    fn test_custom_rule_extracts_fields() {
        let rules = ParseRules {
            custom: vec![
                CustomSmsRule {
                    id: 1,
                    trigger_phrase: "txn alert".to_string(),
                    merchant_regex: Some(r"merchant: ([A-Z ]+);".to_string()),
                    amount_regex: Some(r"amt ([\d,.]+)".to_string()),
                    account_regex: Some(r"(Kotak - xx\d{4})".to_string()),
                    priority: 5,
                },
                CustomSmsRule {
                    id: 2,
                    trigger_phrase: "txn".to_string(),
                    merchant_regex: Some(r"(never)".to_string()),
                    amount_regex: None,
                    account_regex: None,
                    priority: 1,
                },
            ],
            ..Default::default()
        };
        let body = "TXN ALERT Kotak - xx4455 debited amt 1,250.75 merchant: BLUE TOKAI; ref 99";
        let r = parse(&sms(3, "VK-KOTAK", body), &HashMap::new(), &rules).unwrap();
        assert_eq!(r.amount, 1250.75);
        assert_eq!(r.detected_currency_code, None);
        assert_eq!(r.merchant_name.as_deref(), Some("BLUE TOKAI"));
        assert_eq!(account(&r), ("Kotak - xx4455", "Bank Account"));
    }

    #[test]
    fn test_invalid_custom_regex_falls_back_to_defaults() {
        let rules = ParseRules {
            custom: vec![CustomSmsRule {
                id: 1,
                trigger_phrase: "spent".to_string(),
                merchant_regex: Some("(unclosed".to_string()),
                amount_regex: Some("[bad".to_string()),
                account_regex: None,
                priority: 0,
            }],
            ..Default::default()
        };
        let r = parse(&sms(1, "AM-HDFCBK", "You have spent INR 120.00 at CCD."), &HashMap::new(), &rules).unwrap();
        assert_eq!(r.amount, 120.0);
        assert_eq!(r.merchant_name.as_deref(), Some("CCD"));
    }

    #[test]
    fn test_rename_rule_applies_to_parsed_name() {
        let rules = ParseRules {
            renames: HashMap::from([("CCD".to_string(), "Cafe Coffee Day".to_string())]),
            ..Default::default()
        };
        let r = parse(&sms(1, "AM-HDFCBK", "You have spent INR 120.00 at CCD."), &HashMap::new(), &rules).unwrap();
        assert_eq!(r.merchant_name.as_deref(), Some("Cafe Coffee Day"));
    }

    #[test]
    fn test_expense_wins_over_income_keywords() {
        let r = run("VM-X", "Rs 99 debited from your account and credited to merchant wallet").unwrap();
        assert_eq!(r.transaction_type, TransactionType::Expense);
    }

    #[test]
    fn test_merchant_with_call_is_rejected() {
        let r = run("VM-X", "Rs 50 spent at Call Centre.").unwrap();
        assert_eq!(r.merchant_name, None);
    }

    #[test]
    fn test_candidate_carries_sms_identity() {
        let message = sms(77, "AM-HDFCBK", "You have spent INR 120.00 at CCD.");
        let r = parse(&message, &HashMap::new(), &ParseRules::default()).unwrap();
        assert_eq!(r.source_sms_id, 77);
        assert_eq!(r.sms_date, message.date);
        assert_eq!(r.source_sms_hash, sms_hash(&message.sender, &message.body));
        assert_eq!(r.original_message, message.body);
    }
}
