pub mod catalog;
pub mod config;
pub mod differ;
pub mod document;
pub mod matcher;
pub mod resolver;
pub mod rewriter;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod test_support;

// 重新导出主要结构
pub use catalog::{parse_po, SourceLocation, TranslationCatalog, TranslationsMap};
pub use config::{load_config, LoadConfigOptions, LoadedConfig};
pub use differ::{diff_trees, DiffBuilder, DiffPair};
pub use document::{DocumentNode, DocumentSource, FigmaClient, VersionInfo};
pub use matcher::{DisabledMatcher, ElizaClient, FuzzyMatcher, MatchError};
pub use resolver::{Resolution, ResolutionCandidate, Resolver};
pub use rewriter::{FileRewriter, RewriteOutcome, RewriteStatus};
pub use utils::UpdaterError;
pub use workflow::{RunOptions, RunReport, RunSummary, UpdaterWorkflow};
