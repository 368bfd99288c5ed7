// Environment configuration
pub mod config;

// Chat model providers
pub mod llm;

// Analytics backend capability
pub mod analytics;

// Structured output extraction
pub mod extract;

// Prompt text
pub mod prompts;

// Per-run artifact namespace
pub mod session;

// Research workflow module
pub mod research;

// Table-to-chart pipeline
pub mod chart;

// CLI argument parsing
pub mod cli;
