use crate::api::client::ReplicatedLogClient;
use crate::api::options::{ReplicatedLogOptions, ReplicatedLogOptionsValidated};
use crate::api::replicated_log::ReplicatedLog;
use crate::cluster::{ClusterSender, MemberInfo};
use crate::consensus::{CoreConfig, NodeId, RaftCore};
use crate::lifecycle::WorkerHandle;
use crate::observer::CommitObserver;
use crate::store::LogStore;
use crate::timer::TickDriver;
use crate::{executor, flusher};
use std::convert::TryFrom;
use std::sync::Arc;

pub struct ReplicatedLogConfig {
    pub local_id: NodeId,
    /// Full cluster membership, the local node included.
    pub members: Vec<MemberInfo>,
    pub logger: slog::Logger,
    pub options: ReplicatedLogOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("illegal options: {0}")]
    InvalidOptions(&'static str),

    #[error("local node {0} is not in the member list")]
    LocalNodeNotInCluster(NodeId),
}

/// Composition root. Builds and wires every pipeline component via
/// constructor injection and spawns the workers; no component reaches into
/// another's internals.
///
/// The consensus core is built by the injected `build_core` factory from
/// the [`CoreConfig`] derived here; the log store and cluster sender are
/// the caller's collaborators and are only borrowed by the pipeline.
pub async fn start_replicated_log<F>(
    config: ReplicatedLogConfig,
    store: Arc<dyn LogStore>,
    cluster: Arc<dyn ClusterSender>,
    build_core: F,
) -> Result<ReplicatedLogClient, StartupError>
where
    F: FnOnce(CoreConfig) -> Box<dyn RaftCore>,
{
    // Construction order:
    // - consensus core (injected factory)
    // - commit observer
    // - ready flusher (store, cluster, observer)
    // - task executor (owns the core, feeds the flusher)
    // - tick driver (feeds the executor)
    let ReplicatedLogConfig {
        local_id,
        members,
        logger,
        options,
    } = config;

    let options = ReplicatedLogOptionsValidated::try_from(options)
        .map_err(StartupError::InvalidOptions)?;

    if !members.iter().any(|m| m.id == local_id) {
        return Err(StartupError::LocalNodeNotInCluster(local_id));
    }

    let root_logger = logger;

    let core_config = CoreConfig {
        id: local_id,
        peers: members.iter().map(|m| m.id).collect(),
        election_tick: options.election_timeout_ticks,
        heartbeat_tick: options.heartbeat_interval_ticks,
    };
    let core = build_core(core_config);

    let observer = Arc::new(CommitObserver::new(
        root_logger.new(slog::o!("component" => "commit_observer")),
    ));

    let (ready_tx, ready_flusher, fatal_signal) = flusher::create(
        root_logger.new(slog::o!("component" => "ready_flusher")),
        store,
        cluster,
        observer.clone(),
    );

    let (executor_client, task_executor) = executor::create(
        root_logger.new(slog::o!("component" => "task_executor")),
        core,
        observer.clone(),
        ready_tx,
    );

    let flusher_handle = WorkerHandle::spawn("ready_flusher", root_logger.clone(), |stop| {
        tokio::spawn(ready_flusher.run(stop))
    });
    let executor_handle = WorkerHandle::spawn("task_executor", root_logger.clone(), |stop| {
        tokio::spawn(task_executor.run(stop))
    });

    let timer = TickDriver::spawn(options.tick_interval, executor_client.clone());

    slog::info!(
        root_logger,
        "replicated log pipeline started";
        "local_id" => %local_id,
        "members" => members.len(),
    );

    let log = ReplicatedLog::new(executor_client, observer.clone(), options.write_timeout);

    Ok(ReplicatedLogClient::new(
        log,
        fatal_signal,
        timer,
        executor_handle,
        flusher_handle,
        observer,
    ))
}
