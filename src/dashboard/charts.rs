//! ECharts configurations for the dashboard.
//!
//! - **Expenses by category**: a doughnut over the filtered expenses
//! - **Last six months**: monthly income and expense lines over every transaction
//!
//! Options are generated with `charming` and handed to ECharts by a small
//! initialisation script next to each chart.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Color, JsFunction, Tooltip, Trigger,
    },
    series::{Line, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::dashboard::aggregation::{CategoryTotal, MONTHS_IN_SERIES, MonthlyTotals};

const INCOME_COLOR: &str = "#16a34a";
const EXPENSE_COLOR: &str = "#dc2626";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

impl DashboardChart {
    pub(super) fn category_breakdown(totals: &[CategoryTotal]) -> Self {
        Self {
            id: "category-chart",
            options: category_chart(totals).to_string(),
        }
    }

    pub(super) fn monthly_series(series: &[MonthlyTotals; MONTHS_IN_SERIES]) -> Self {
        Self {
            id: "monthly-chart",
            options: monthly_chart(series).to_string(),
        }
    }
}

/// The container the chart is drawn into.
pub(super) fn chart_container(chart: &DashboardChart) -> Markup {
    html!(
        div
            id=(chart.id)
            class="min-h-[380px] w-full rounded dark:bg-gray-100"
        {}
    )
}

/// JavaScript that draws `chart` into its container, following the system
/// colour scheme and the window size.
fn init_script(chart: &DashboardChart) -> String {
    format!(
        r#"(function() {{
            const chartDom = document.getElementById("{}");
            if (!chartDom) {{ return; }}
            const chart = echarts.init(chartDom);
            const option = {};
            chart.setOption(option);

            window.addEventListener('resize', chart.resize);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                const isDarkMode = darkModeMediaQuery.matches;
                chart.setTheme(isDarkMode ? 'dark' : 'default');
            }}
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();
        }})();"#,
        chart.id, chart.options
    )
}

/// Initialisation code placed right after a chart container, so the chart is
/// drawn again whenever htmx swaps the container in.
pub(super) fn inline_chart_script(chart: &DashboardChart) -> Markup {
    html!(
        script { (PreEscaped(init_script(chart))) }
    )
}

fn category_chart(totals: &[CategoryTotal]) -> Chart {
    let data = totals
        .iter()
        .map(|total| (total.total, total.label))
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text("Expenses by category"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().top("bottom").left("center"))
        .series(
            Pie::new()
                .name("Expenses")
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

fn monthly_chart(series: &[MonthlyTotals; MONTHS_IN_SERIES]) -> Chart {
    let labels = series.iter().map(MonthlyTotals::label).collect::<Vec<_>>();
    let income = series.iter().map(|month| month.income).collect::<Vec<_>>();
    let expense = series.iter().map(|month| month.expense).collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text("Last six months"))
        .tooltip(currency_tooltip())
        .legend(Legend::new().top("bottom").left("center"))
        .color(vec![Color::from(INCOME_COLOR), Color::from(EXPENSE_COLOR)])
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("12%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Line::new().name("Income").data(income))
        .series(Line::new().name("Expenses").data(expense))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
