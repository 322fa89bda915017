use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    html::{
        FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
    transaction::{Category, Transaction, TransactionFields, TransactionType},
};

/// The form data for creating or editing a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    /// Income or expense.
    pub type_: TransactionType,
    /// Text detailing the transaction.
    #[serde(default)]
    pub description: String,
    /// The value of the transaction in dollars.
    pub amount: f64,
    /// What the transaction was for.
    #[serde(default)]
    pub category: Category,
    /// The date when the transaction occurred.
    pub date: Date,
}

impl TryFrom<TransactionForm> for TransactionFields {
    type Error = Error;

    fn try_from(form: TransactionForm) -> Result<Self, Self::Error> {
        TransactionFields::new(
            form.type_,
            &form.description,
            form.amount,
            form.category,
            form.date,
        )
    }
}

/// The values a transaction form starts with.
pub struct TransactionFormDefaults<'a> {
    pub transaction_type: TransactionType,
    pub amount: Option<f64>,
    pub date: Date,
    pub description: Option<&'a str>,
    pub category: Category,
    pub autofocus_amount: bool,
}

impl<'a> TransactionFormDefaults<'a> {
    /// An empty expense dated `today`.
    pub fn new_expense(today: Date) -> Self {
        Self {
            transaction_type: TransactionType::Expense,
            amount: None,
            date: today,
            description: None,
            category: Category::default(),
            autofocus_amount: false,
        }
    }

    /// The current values of `transaction`.
    pub fn from_transaction(transaction: &'a Transaction) -> Self {
        Self {
            transaction_type: transaction.type_,
            amount: Some(transaction.amount),
            date: transaction.date,
            description: Some(&transaction.description),
            category: transaction.category,
            autofocus_amount: true,
        }
    }
}

pub fn transaction_form_fields(defaults: &TransactionFormDefaults<'_>) -> Markup {
    let is_expense = matches!(defaults.transaction_type, TransactionType::Expense);
    let amount_str = defaults.amount.map(|amount| format!("{amount:.2}"));

    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Transaction type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                div class="flex items-center gap-3"
                {
                    input
                        name="type_"
                        id="transaction-type-expense"
                        type="radio"
                        value="expense"
                        checked[is_expense]
                        required
                        tabindex="0"
                        class=(FORM_RADIO_INPUT_STYLE);

                    label
                        for="transaction-type-expense"
                        class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Expense"
                    }
                }

                div class="flex items-center gap-3"
                {
                    input
                        name="type_"
                        id="transaction-type-income"
                        type="radio"
                        value="income"
                        checked[!is_expense]
                        required
                        tabindex="0"
                        class=(FORM_RADIO_INPUT_STYLE);

                    label
                        for="transaction-type-income"
                        class=(FORM_RADIO_LABEL_STYLE)
                    {
                        "Income"
                    }
                }
            }
        }

        div
        {
            label
                for="description"
                class=(FORM_LABEL_STYLE)
            {
                "Description"
            }

            input
                name="description"
                id="description"
                type="text"
                placeholder="e.g. Weekly groceries"
                value=[defaults.description]
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="amount"
                class=(FORM_LABEL_STYLE)
            {
                "Amount"
            }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    placeholder="0.00"
                    min="0"
                    required
                    value=[amount_str.as_deref()]
                    autofocus[defaults.autofocus_amount]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label
                for="category"
                class=(FORM_LABEL_STYLE)
            {
                "Category"
            }

            select
                name="category"
                id="category"
                class=(FORM_TEXT_INPUT_STYLE)
            {
                @for category in Category::ALL {
                    option
                        value=(category.as_str())
                        selected[category == defaults.category]
                    {
                        (category.icon()) " " (category.label())
                    }
                }
            }
        }

        div
        {
            label
                for="date"
                class=(FORM_LABEL_STYLE)
            {
                "Date"
            }

            input
                name="date"
                id="date"
                type="date"
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use super::{TransactionForm, TransactionFormDefaults, transaction_form_fields};
    use crate::{
        Error,
        transaction::{Category, TransactionFields, TransactionType, core::test_transaction},
    };

    #[test]
    fn transaction_form_fields_checks_selected_type() {
        let cases = [
            (TransactionType::Expense, "expense"),
            (TransactionType::Income, "income"),
        ];

        for (transaction_type, expected) in cases {
            let mut defaults = TransactionFormDefaults::new_expense(date!(2024 - 01 - 20));
            defaults.transaction_type = transaction_type;
            let html = render_fields(&defaults);
            assert_checked_value(&html, expected);
        }
    }

    #[test]
    fn edit_defaults_select_current_category() {
        let transaction = test_transaction(
            1,
            TransactionType::Expense,
            42.0,
            Category::Health,
            date!(2024 - 01 - 20),
        );

        let html = render_fields(&TransactionFormDefaults::from_transaction(&transaction));

        let selector = Selector::parse("select[name=category] option[selected]").unwrap();
        let selected: Vec<_> = html.select(&selector).collect();
        assert_eq!(selected.len(), 1, "want one selected category");
        assert_eq!(selected[0].value().attr("value"), Some("health"));

        let amount = Selector::parse("input[name=amount]").unwrap();
        assert_eq!(
            html.select(&amount).next().unwrap().value().attr("value"),
            Some("42.00")
        );
    }

    #[test]
    fn form_parses_into_fields() {
        let form: TransactionForm = serde_html_form::from_str(
            "type_=income&description=Salary&amount=1000&category=work&date=2024-01-10",
        )
        .unwrap();

        let fields = TransactionFields::try_from(form).unwrap();

        assert_eq!(fields.type_, TransactionType::Income);
        assert_eq!(fields.category, Category::Work);
        assert_eq!(fields.date, date!(2024 - 01 - 10));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let form: TransactionForm = serde_html_form::from_str(
            "type_=expense&description=Oops&amount=-1&category=food&date=2024-01-10",
        )
        .unwrap();

        assert_eq!(
            TransactionFields::try_from(form),
            Err(Error::InvalidAmount(-1.0))
        );
    }

    fn render_fields(defaults: &TransactionFormDefaults<'_>) -> Html {
        let fields = transaction_form_fields(defaults);
        let markup = maud::html! { form { (fields) } };
        Html::parse_document(&markup.into_string())
    }

    #[track_caller]
    fn assert_checked_value(document: &Html, expected: &str) {
        let selector = Selector::parse("input[type=radio][name=type_]").unwrap();
        let inputs = document.select(&selector).collect::<Vec<_>>();
        assert_eq!(
            inputs.len(),
            2,
            "want 2 transaction type inputs, got {}",
            inputs.len()
        );

        let checked = inputs
            .iter()
            .find(|input| input.value().attr("checked").is_some())
            .and_then(|input| input.value().attr("value"));
        assert_eq!(
            checked,
            Some(expected),
            "want checked transaction type to be {expected}, got {checked:?}"
        );
    }
}
