//! The research crew: three analysts and a writer
//!
//! Agent personas and task prompts reference the crew inputs
//! (`{{ ticker }}`, `{{ start_date }}`, `{{ end_date }}`), which are filled in
//! from the [`ResearchRequest`] at kickoff.

use crate::api::{MetricsSource, NewsSource, PriceHistory};
use crate::error::Result;
use crate::form::ResearchRequest;
use crate::tools::{NewsSearchTool, RiskAssessmentTool, StockPriceTool};
use agent_crew::{Crew, CrewEventHandler, CrewOutput, Process, Task};
use agent_llm::{DEFAULT_MODEL, LLMProvider};
use agent_runtime::RoleAgent;
use agent_tools::{Tool, ToolCache};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Roles, as co-workers address each other
pub mod roles {
    pub const PRICE_ANALYST: &str = "Senior Stock Price Analyst";
    pub const RISK_ANALYST: &str = "Risk Analyst";
    pub const NEWS_ANALYST: &str = "Stock News Analyst";
    pub const WRITER: &str = "Senior Stock Analysts Writer";
}

/// Task names
pub mod tasks {
    pub const GET_STOCK_PRICE: &str = "get_stock_price";
    pub const GET_NEWS: &str = "get_news";
    pub const GET_RISKS: &str = "get_risks";
    pub const WRITE_ANALYSES: &str = "write_analyses";
}

const ANALYST_MAX_ITER: usize = 5;
const WRITER_MAX_ITER: usize = 10;
const MANAGER_MAX_ITER: usize = 10;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

const PRICE_ANALYST_GOAL: &str = "Find the {{ ticker }} company stock price and analyze trends";
const PRICE_ANALYST_BACKSTORY: &str = "You're highly experienced in analyzing the price of a \
    specific stock and make predictions about its future price.";

const RISK_ANALYST_GOAL: &str =
    "Identify and evaluate the various risks associated with investing in the {{ ticker }} company";
const RISK_ANALYST_BACKSTORY: &str = "You are a seasoned risk analyst, proficient in identifying \
    and assessing market, operational, regulatory, and ESG risks that could impact investment \
    decisions.";

const NEWS_ANALYST_GOAL: &str = "Create a short summary of the market news related to the stock \
    {{ ticker }} company about the date history from {{ start_date }} to {{ end_date }}. Specify \
    the current trend - up, down or sideways with the news context. For each requested stock \
    asset, specify a number between 0 and 100, where 0 is extreme fear and 100 is extreme greed.";
const NEWS_ANALYST_BACKSTORY: &str = "\
You're highly experienced in analyzing the market trends and news and have tracked assets for more than 10 years.
You're also a master-level analyst in traditional markets and have a deep understanding of human psychology.
You understand news, their titles, and information, but you look at those with a healthy dose of skepticism.
You also consider the source of the news articles.";

const WRITER_GOAL: &str = "Analyze the trends in price, risk analysis, and news and write an \
    insightful, compelling, and informative 3-paragraph long newsletter based on the stock report \
    and price trend.";
const WRITER_BACKSTORY: &str = "\
You're widely accepted as the best stock analyst in the market. You understand complex concepts and create compelling stories
and narratives that resonate with wider audiences.

You understand macro factors and combine multiple theories - e.g., cycle theory and fundamental analyses.
You're able to hold multiple opinions when analyzing anything.";

const GET_STOCK_PRICE_DESCRIPTION: &str = "Analyze the stock {{ ticker }} company price history \
    from {{ start_date }} to {{ end_date }} and create a trend analysis of up, down or stable";
const GET_STOCK_PRICE_EXPECTED: &str =
    "Specify the current trend stock price - up, down or stable. eg. stock='AAPL, price UP'";

const GET_NEWS_DESCRIPTION: &str = "\
Take the stock and always include BTC to it (if not requested).
Use the search tool to search each one individually.

Use the date history from {{ start_date }} to {{ end_date }}.

Compose the results into a helpful report";
const GET_NEWS_EXPECTED: &str = "\
A summary of the overall market and one sentence summary for each requested asset.
Include a fear/greed score for each asset based on the news. Use format:
<STOCK ASSET>
<SUMMARY BASED ON NEWS>
<TREND PREDICTION>
<FEAR/GREED SCORE>";

const GET_RISKS_DESCRIPTION: &str =
    "Evaluate the different types of risks associated with investing in {{ ticker }}.";
const GET_RISKS_EXPECTED: &str = "A comprehensive risk assessment report detailing market, \
    operational, regulatory, and ESG risks.";

const WRITE_ANALYSES_DESCRIPTION: &str = "\
Use the stock price trend, risk analysis, and stock news report to create a comprehensive analysis and write the newsletter about the specific company.
Focus on the stock price trend, news, fear/greed score, and risk assessment. What are the near future considerations?
Include the previous analyses of stock trend, news summary, and detailed risk assessment in your final report.";
const WRITE_ANALYSES_EXPECTED: &str = "\
An eloquent 3 paragraphs newsletter formatted as markdown in an easy-to-read manner. It should contain:

- 3 bullet executive summary
- Introduction - set the overall picture and spark interest
- Main part - provides the core analysis including the news summary, risk assessment, and fear/greed scores
- Summary - key facts and concrete future trend prediction - up, down, or sideways.
Avoid any signatures or author names.";

/// Data sources behind the analysts' tools
#[derive(Clone)]
pub struct DataSources {
    /// Price history for the price analyst
    pub prices: Arc<dyn PriceHistory>,
    /// Fundamentals for the risk analyst; defaults apply without it
    pub metrics: Option<Arc<dyn MetricsSource>>,
    /// News for the news analyst; search reports itself unavailable without it
    pub news: Option<Arc<dyn NewsSource>>,
}

impl DataSources {
    /// Sources with only a price provider
    pub fn new(prices: Arc<dyn PriceHistory>) -> Self {
        Self {
            prices,
            metrics: None,
            news: None,
        }
    }

    /// Add a fundamentals source
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSource>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Add a news source
    pub fn with_news(mut self, news: Arc<dyn NewsSource>) -> Self {
        self.news = Some(news);
        self
    }
}

/// The assembled research crew
#[derive(Debug)]
pub struct ResearchCrew {
    crew: Crew,
}

impl ResearchCrew {
    /// Start building the crew
    pub fn builder(provider: Arc<dyn LLMProvider>, sources: DataSources) -> ResearchCrewBuilder {
        ResearchCrewBuilder::new(provider, sources)
    }

    /// The underlying crew
    pub fn crew(&self) -> &Crew {
        &self.crew
    }

    /// Research one company over the requested window
    pub async fn run(&self, request: &ResearchRequest) -> Result<CrewOutput> {
        info!(
            company = %request.company,
            ticker = %request.ticker,
            range = %request.range(),
            "Starting research"
        );
        Ok(self.crew.kickoff(request.inputs()).await?)
    }
}

/// Builder for [`ResearchCrew`]
pub struct ResearchCrewBuilder {
    provider: Arc<dyn LLMProvider>,
    sources: DataSources,
    model: String,
    process: Process,
    verbose: bool,
    cache_ttl: Option<Duration>,
    event_handler: Option<Arc<dyn CrewEventHandler>>,
}

impl ResearchCrewBuilder {
    /// Create a builder with the default model and a hierarchical process
    pub fn new(provider: Arc<dyn LLMProvider>, sources: DataSources) -> Self {
        Self {
            provider,
            sources,
            model: DEFAULT_MODEL.to_string(),
            process: Process::Hierarchical,
            verbose: false,
            cache_ttl: Some(DEFAULT_CACHE_TTL),
            event_handler: None,
        }
    }

    /// Model for every agent and the manager
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Process used to run the tasks
    pub fn process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    /// Log agent prompts and answers
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Tool result cache TTL; `Duration::ZERO` disables caching
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = (!ttl.is_zero()).then_some(ttl);
        self
    }

    /// Receive task callbacks
    pub fn event_handler(mut self, handler: Arc<dyn CrewEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    fn agent(&self, role: &str, goal: &str, backstory: &str) -> agent_runtime::RoleAgentBuilder {
        RoleAgent::builder(role)
            .goal(goal)
            .backstory(backstory)
            .model(self.model.clone())
            .provider(self.provider.clone())
            .verbose(self.verbose)
    }

    /// Assemble agents, tasks and the crew
    pub fn build(self) -> Result<ResearchCrew> {
        let price_tool = Arc::new(StockPriceTool::new(self.sources.prices.clone()));
        let risk_tool: Arc<dyn Tool> = Arc::new(match &self.sources.metrics {
            Some(metrics) => RiskAssessmentTool::new(metrics.clone()),
            None => RiskAssessmentTool::unavailable(),
        });
        let news_tool: Arc<dyn Tool> = Arc::new(match &self.sources.news {
            Some(news) => NewsSearchTool::new(news.clone()),
            None => NewsSearchTool::unavailable(),
        });

        let price_analyst = self
            .agent(roles::PRICE_ANALYST, PRICE_ANALYST_GOAL, PRICE_ANALYST_BACKSTORY)
            .tool(price_tool.clone())
            .max_iter(ANALYST_MAX_ITER)
            .allow_delegation(false)
            .build()?;

        let news_analyst = self
            .agent(roles::NEWS_ANALYST, NEWS_ANALYST_GOAL, NEWS_ANALYST_BACKSTORY)
            .tool(news_tool)
            .max_iter(ANALYST_MAX_ITER)
            .allow_delegation(false)
            .build()?;

        let risk_analyst = self
            .agent(roles::RISK_ANALYST, RISK_ANALYST_GOAL, RISK_ANALYST_BACKSTORY)
            .tool(risk_tool)
            .max_iter(ANALYST_MAX_ITER)
            .allow_delegation(false)
            .build()?;

        let writer = self
            .agent(roles::WRITER, WRITER_GOAL, WRITER_BACKSTORY)
            .max_iter(WRITER_MAX_ITER)
            .allow_delegation(true)
            .build()?;

        let mut crew = Crew::builder()
            .agent(price_analyst)
            .agent(news_analyst)
            .agent(risk_analyst)
            .agent(writer)
            .task(
                Task::builder(tasks::GET_STOCK_PRICE)
                    .description(GET_STOCK_PRICE_DESCRIPTION)
                    .expected_output(GET_STOCK_PRICE_EXPECTED)
                    .agent(roles::PRICE_ANALYST)
                    .prefetch(price_tool)
                    .build(),
            )
            .task(
                Task::builder(tasks::GET_NEWS)
                    .description(GET_NEWS_DESCRIPTION)
                    .expected_output(GET_NEWS_EXPECTED)
                    .agent(roles::NEWS_ANALYST)
                    .build(),
            )
            .task(
                Task::builder(tasks::GET_RISKS)
                    .description(GET_RISKS_DESCRIPTION)
                    .expected_output(GET_RISKS_EXPECTED)
                    .agent(roles::RISK_ANALYST)
                    .build(),
            )
            .task(
                Task::builder(tasks::WRITE_ANALYSES)
                    .description(WRITE_ANALYSES_DESCRIPTION)
                    .expected_output(WRITE_ANALYSES_EXPECTED)
                    .agent(roles::WRITER)
                    .context(tasks::GET_STOCK_PRICE)
                    .context(tasks::GET_NEWS)
                    .context(tasks::GET_RISKS)
                    .build(),
            )
            .process(self.process)
            .manager_provider(self.provider.clone())
            .manager_model(self.model.clone())
            .max_iter(MANAGER_MAX_ITER);

        crew = match self.cache_ttl {
            Some(ttl) => crew.cache(ToolCache::new(ttl)),
            None => crew.without_cache(),
        };
        if let Some(handler) = self.event_handler {
            crew = crew.event_handler(handler);
        }

        Ok(ResearchCrew {
            crew: crew.build()?,
        })
    }
}
