use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio::runtime::Runtime;

use kms_ship::cli::{AccountLookupKind, Args, EncryptorKind};
use kms_ship::cloud::s3::S3Store;
use kms_ship::config::{job_from_args, EnvSnapshot, LoggingOptions};
use kms_ship::constants::EXIT_FAILURE;
use kms_ship::encrypt::kms::KmsEncryptor;
use kms_ship::encrypt::sops::SopsEncryptor;
use kms_ship::encrypt::Encryptor;
use kms_ship::logging::{bridge, Logger};
use kms_ship::pipeline::Pipeline;
use kms_ship::resolver::account::{AccountLookup, InstanceProfileLookup, StsLookup};
use kms_ship::resolver::metadata::{ImdsClient, MetadataClient};
use kms_ship::resolver::TargetResolver;

fn main() {
    // Parse arguments
    let args = Args::parse();
    let env = EnvSnapshot::capture();

    // Initialize logging
    let options = LoggingOptions::resolve(&args, &env);
    let logger = Arc::new(Logger::console(options.minimum, &options.palette()));
    if let Err(e) = bridge::install(Arc::clone(&logger)) {
        logger.warning(format!("Failed to route library logging: {}", e));
    }

    if let Err(e) = run(&args, &env, Arc::clone(&logger)) {
        logger.error(format!("{:#}", e));
        process::exit(EXIT_FAILURE);
    }
}

/// Build the job and the pipeline, then drive it on a fresh runtime.
fn run(args: &Args, env: &EnvSnapshot, logger: Arc<Logger>) -> Result<()> {
    let job = job_from_args(args, env, Utc::now())?;
    logger.trace(format!("Job: {:?}", job));

    let mut pipeline = build_pipeline(args, env, Arc::clone(&logger))?;

    let runtime = Runtime::new().context("Failed to create Tokio runtime")?;
    let report = runtime.block_on(pipeline.run(&job))?;

    logger.debug(format!(
        "Encrypted copy left at {} ({})",
        report.destination_path.display(),
        report.region
    ));
    Ok(())
}

fn build_pipeline(args: &Args, env: &EnvSnapshot, logger: Arc<Logger>) -> Result<Pipeline> {
    let metadata: Arc<dyn MetadataClient> = Arc::new(ImdsClient::from_env(env)?);

    let accounts: Arc<dyn AccountLookup> = match args.account_lookup {
        AccountLookupKind::InstanceProfile => Arc::new(InstanceProfileLookup::new(Arc::clone(&metadata))),
        AccountLookupKind::Sts => Arc::new(StsLookup),
    };

    let encryptor: Arc<dyn Encryptor> = match args.encryptor {
        EncryptorKind::Sops => Arc::new(SopsEncryptor::new(&args.sops_binary)),
        EncryptorKind::Kms => Arc::new(KmsEncryptor::default()),
    };
    logger.trace(format!("Using {} encryptor", encryptor.name()));

    let resolver = TargetResolver::new(metadata, accounts, Arc::clone(&logger));
    Ok(Pipeline::new(resolver, encryptor, Arc::new(S3Store), logger))
}
