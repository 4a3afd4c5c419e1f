//! Deterministic synthetic corpus.
//!
//! Each generator expands a static table of subjects (items or parties with
//! candidate amounts) against a static list of phrasing templates. Only the
//! first [`AMOUNTS_PER_SUBJECT`] amounts and first [`TEMPLATES_PER_SUBJECT`]
//! templates are used per subject to keep the corpus in the hundreds.

use serde_json::json;

use super::types::{TestCase, TransactionType};

pub const AMOUNTS_PER_SUBJECT: usize = 3;
pub const TEMPLATES_PER_SUBJECT: usize = 2;

struct Subject {
    name: &'static str,
    detail: &'static str,
    amounts: &'static [u32],
}

/// Phrasing with `{name}`, `{detail}` and `{amount}` placeholders
struct Template {
    text: &'static str,
    category: &'static str,
}

const fn subject(name: &'static str, detail: &'static str, amounts: &'static [u32]) -> Subject {
    Subject {
        name,
        detail,
        amounts,
    }
}

const fn template(text: &'static str, category: &'static str) -> Template {
    Template { text, category }
}

const EXPENSE_SUBJECTS: &[Subject] = &[
    subject("chai", "", &[20, 50, 120, 200]),
    subject("petrol", "", &[500, 1000, 2000]),
    subject("electricity bill", "", &[1450, 2300, 3100]),
    subject("shop rent", "", &[8000, 12000, 15000]),
    subject("staff salary", "", &[9000, 14000, 18000]),
    subject("auto fare", "", &[60, 150, 300]),
    subject("packing material", "", &[350, 800, 1200]),
    subject("mobile recharge", "", &[199, 299, 599]),
    subject("internet bill", "", &[499, 799, 999]),
    subject("stationery", "", &[75, 240, 560]),
    subject("lunch for staff", "", &[300, 650, 900]),
    subject("transport charges", "", &[1500, 2500, 4000]),
    subject("repair work", "", &[700, 1800, 3500]),
    subject("water cans", "", &[40, 80, 160]),
];

const EXPENSE_TEMPLATES: &[Template] = &[
    template("Spent {amount} rupees on {name}", "basic"),
    template("{name} ka kharcha {amount} rupaye", "hinglish"),
    template("Add an expense of {amount} for {name}", "basic"),
];

const SALE_INVOICE_SUBJECTS: &[Subject] = &[
    subject("Sharma ji", "10 bags of cement", &[3800, 4200, 4500]),
    subject("Gupta Traders", "25 kg basmati rice", &[2250, 2600, 3000]),
    subject("Ramesh", "2 ceiling fans", &[3400, 3900, 4400]),
    subject("Priya Boutique", "15 meters silk fabric", &[6750, 7200, 8100]),
    subject("Mehta Stores", "40 notebooks", &[1200, 1600, 2000]),
    subject("Anil Kumar", "5 litres paint", &[1750, 2100, 2600]),
    subject("Singh Hardware", "100 screws and 20 hinges", &[900, 1150, 1400]),
    subject("Kavita", "3 pressure cookers", &[4200, 4800, 5400]),
    subject("Joshi Medicals", "12 boxes of gloves", &[1800, 2160, 2500]),
    subject("Verma Electricals", "8 LED bulbs", &[960, 1200, 1440]),
];

const SALE_INVOICE_TEMPLATES: &[Template] = &[
    template("Create an invoice for {name} for {detail} at {amount} rupees", "basic"),
    template("{name} ko {detail} becha {amount} mein, bill bana do", "hinglish"),
    template("Sold {detail} to {name}, total {amount}", "basic"),
];

const PAYMENT_IN_SUBJECTS: &[Subject] = &[
    subject("Amit", "", &[500, 1500, 2500]),
    subject("Sharma ji", "", &[1000, 3800, 5000]),
    subject("Gupta Traders", "", &[2000, 4500, 7000]),
    subject("Neha", "", &[300, 750, 1200]),
    subject("Rahul Enterprises", "", &[10000, 15000, 25000]),
    subject("Mehta Stores", "", &[600, 1600, 2400]),
    subject("Kavita", "", &[450, 900, 1800]),
    subject("Joshi Medicals", "", &[1100, 2160, 3300]),
    subject("Pooja", "", &[250, 500, 1000]),
    subject("Singh Hardware", "", &[1400, 2800, 4200]),
];

const PAYMENT_IN_TEMPLATES: &[Template] = &[
    template("Received {amount} rupees from {name}", "basic"),
    template("{name} se {amount} mil gaye", "hinglish"),
    template("{name} paid me {amount} by UPI", "basic"),
];

const PAYMENT_OUT_SUBJECTS: &[Subject] = &[
    subject("the supplier", "", &[5000, 12000, 20000]),
    subject("Ravi", "", &[500, 800, 1500]),
    subject("the landlord", "", &[8000, 12000, 15000]),
    subject("Bharat Wholesale", "", &[7500, 9800, 14000]),
    subject("the electrician", "", &[600, 1200, 1800]),
    subject("Suresh", "", &[250, 700, 1100]),
    subject("the transporter", "", &[1500, 2500, 4000]),
    subject("Lakshmi Textiles", "", &[6200, 9300, 12400]),
    subject("the plumber", "", &[400, 900, 1300]),
    subject("Agarwal Distributors", "", &[3300, 6600, 9900]),
];

const PAYMENT_OUT_TEMPLATES: &[Template] = &[
    template("Paid {amount} rupees to {name}", "basic"),
    template("{name} ko {amount} de diye", "hinglish"),
    template("Sent {amount} to {name} via bank transfer", "basic"),
];

const OTHER_UTTERANCES: &[(&str, &str)] = &[
    ("Hello, how are you?", "small_talk"),
    ("What can you do?", "small_talk"),
    ("Show me today's sales", "query"),
    ("How much did I spend this month?", "query"),
    ("Kitna paisa baaki hai Sharma ji ka?", "hinglish"),
    ("Delete the last invoice", "unsupported"),
    ("Remind me to call Gupta ji tomorrow", "unsupported"),
    ("What is the GST rate on cement?", "query"),
    ("Thank you", "small_talk"),
    ("Undo that", "unsupported"),
    ("asdf qwerty", "noise"),
    ("Mera balance batao", "hinglish"),
    ("Change the language to Hindi", "unsupported"),
    ("Who owes me money?", "query"),
    ("Play some music", "noise"),
    ("Kal ka hisaab dikhao", "hinglish"),
];

fn render(template: &Template, subject: &Subject, amount: u32) -> String {
    template
        .text
        .replace("{name}", subject.name)
        .replace("{detail}", subject.detail)
        .replace("{amount}", &amount.to_string())
}

fn expand(
    transaction_type: TransactionType,
    base_id: u32,
    subjects: &[Subject],
    templates: &[Template],
) -> Vec<TestCase> {
    let mut cases = Vec::new();
    for subject in subjects {
        for &amount in subject.amounts.iter().take(AMOUNTS_PER_SUBJECT) {
            for template in templates.iter().take(TEMPLATES_PER_SUBJECT) {
                let id = base_id + cases.len() as u32;
                let input = render(template, subject, amount);
                cases.push(
                    TestCase::new(id, transaction_type, &input, template.category)
                        .with_expected_output(json!(amount)),
                );
            }
        }
    }
    cases
}

pub fn generate_expense_variations(base_id: u32) -> Vec<TestCase> {
    expand(
        TransactionType::Expense,
        base_id,
        EXPENSE_SUBJECTS,
        EXPENSE_TEMPLATES,
    )
}

pub fn generate_sale_invoice_variations(base_id: u32) -> Vec<TestCase> {
    expand(
        TransactionType::SaleInvoice,
        base_id,
        SALE_INVOICE_SUBJECTS,
        SALE_INVOICE_TEMPLATES,
    )
}

pub fn generate_payment_in_variations(base_id: u32) -> Vec<TestCase> {
    expand(
        TransactionType::PaymentIn,
        base_id,
        PAYMENT_IN_SUBJECTS,
        PAYMENT_IN_TEMPLATES,
    )
}

pub fn generate_payment_out_variations(base_id: u32) -> Vec<TestCase> {
    expand(
        TransactionType::PaymentOut,
        base_id,
        PAYMENT_OUT_SUBJECTS,
        PAYMENT_OUT_TEMPLATES,
    )
}

/// Free-form utterances that should not produce a transaction
pub fn generate_other_variations(base_id: u32) -> Vec<TestCase> {
    OTHER_UTTERANCES
        .iter()
        .enumerate()
        .map(|(idx, (input, category))| {
            TestCase::new(base_id + idx as u32, TransactionType::Other, input, category)
        })
        .collect()
}

/// Hand-written cases covering context carry-over and mixed phrasing
pub fn seed_cases() -> Vec<TestCase> {
    vec![
        TestCase::new(1, TransactionType::Expense, "Spent 250 on office tea and snacks", "basic")
            .with_expected_output(json!(250)),
        TestCase::new(
            2,
            TransactionType::SaleInvoice,
            "Bill Sharma ji for 10 bags of cement at 380 each",
            "basic",
        )
        .with_expected_output(json!(3800)),
        TestCase::new(3, TransactionType::PaymentIn, "Amit ne 2000 bhej diye", "hinglish")
            .with_expected_output(json!(2000)),
        TestCase::new(4, TransactionType::PaymentOut, "Paid the supplier 15000 in cash", "basic")
            .with_expected_output(json!(15000)),
        TestCase::new(
            5,
            TransactionType::SaleInvoice,
            "Add 5 more bags to the same invoice",
            "context",
        )
        .with_context("Follows an invoice for Sharma ji"),
        TestCase::new(6, TransactionType::PaymentIn, "He paid the rest of it today", "context")
            .with_context("Customer Amit has 1800 outstanding"),
        TestCase::new(7, TransactionType::Expense, "Diesel 1500, toll 200", "multi_item"),
        TestCase::new(8, TransactionType::Other, "Cancel", "small_talk"),
    ]
}

/// Seed cases plus every generator, re-numbered to `index + 1`
pub fn build_corpus() -> Vec<TestCase> {
    type Generator = fn(u32) -> Vec<TestCase>;
    const GENERATORS: [Generator; 5] = [
        generate_expense_variations,
        generate_sale_invoice_variations,
        generate_payment_in_variations,
        generate_payment_out_variations,
        generate_other_variations,
    ];

    let mut corpus = seed_cases();
    for generate in GENERATORS {
        let base_id = corpus.len() as u32 + 1;
        corpus.extend(generate(base_id));
    }

    for (idx, case) in corpus.iter_mut().enumerate() {
        case.id = idx as u32 + 1;
    }
    corpus
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_expense_generation_is_deterministic() {
        assert_eq!(
            generate_expense_variations(101),
            generate_expense_variations(101)
        );
    }

    #[test]
    fn test_generator_ids_start_at_base() {
        let cases = generate_payment_in_variations(500);
        assert_eq!(cases.first().map(|c| c.id), Some(500));
        assert_eq!(cases.last().map(|c| c.id), Some(500 + cases.len() as u32 - 1));
    }

    #[test]
    fn test_generation_is_bounded_per_subject() {
        let cases = generate_expense_variations(1);
        assert_eq!(
            cases.len(),
            EXPENSE_SUBJECTS.len() * AMOUNTS_PER_SUBJECT * TEMPLATES_PER_SUBJECT
        );
        // the fourth chai amount is beyond the prefix
        assert!(!cases.iter().any(|c| c.input.contains(" 200 rupees on chai")));
        // the third template is never used
        assert!(!cases.iter().any(|c| c.input.starts_with("Add an expense")));
    }

    #[test]
    fn test_templates_are_fully_rendered() {
        let cases = generate_sale_invoice_variations(1);
        assert!(cases.iter().all(|c| !c.input.contains('{')));
        assert_eq!(
            cases[0].input,
            "Create an invoice for Sharma ji for 10 bags of cement at 3800 rupees"
        );
        assert_eq!(cases[0].expected_output, Some(json!(3800)));
        assert_eq!(cases[1].category, "hinglish");
    }

    #[test]
    fn test_corpus_ids_are_unique_and_contiguous() {
        let corpus = build_corpus();
        assert!(corpus.len() > 250);

        let ids: HashSet<u32> = corpus.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), corpus.len());
        assert!(corpus.iter().enumerate().all(|(i, c)| c.id == i as u32 + 1));
    }

    #[test]
    fn test_corpus_covers_every_type() {
        let corpus = build_corpus();
        for t in TransactionType::ALL {
            assert!(corpus.iter().any(|c| c.transaction_type == t), "no {} cases", t);
        }
    }
}
