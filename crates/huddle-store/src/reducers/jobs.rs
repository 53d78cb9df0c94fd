use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use huddle_shared::{Job, JobType};

use crate::action::{Action, JobAction};
use crate::reducers::{cleared, with_entries, with_entry};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobsState {
    pub jobs: Arc<HashMap<String, Job>>,
    /// Latest listing per job type, in server order.
    pub jobs_by_type_list: Arc<HashMap<JobType, Vec<Job>>>,
}

pub fn reduce(state: &Arc<JobsState>, action: &Action) -> Arc<JobsState> {
    let action = match action {
        Action::LogoutSuccess => return cleared(state),
        Action::Jobs(a) => a,
        _ => return Arc::clone(state),
    };

    let (jobs, jobs_by_type_list) = match action {
        JobAction::ReceivedJob(job) => (
            with_entry(&state.jobs, job.id.clone(), job.clone()),
            Arc::clone(&state.jobs_by_type_list),
        ),
        JobAction::ReceivedJobs(list) => (
            with_entries(&state.jobs, list.iter().cloned(), |j| j.id.clone()),
            Arc::clone(&state.jobs_by_type_list),
        ),
        JobAction::ReceivedJobsByType { job_type, jobs } => (
            with_entries(&state.jobs, jobs.iter().cloned(), |j| j.id.clone()),
            with_entry(&state.jobs_by_type_list, *job_type, jobs.clone()),
        ),
    };

    Arc::new(JobsState {
        jobs,
        jobs_by_type_list,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_shared::JobStatus;

    fn job(id: &str, job_type: JobType) -> Job {
        Job {
            id: id.into(),
            job_type,
            priority: 0,
            create_at: 0,
            start_at: 0,
            last_activity_at: 0,
            status: JobStatus::Pending,
            progress: 0,
            data: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_jobs_by_type_replaces_listing() {
        let state = Arc::new(JobsState::default());
        let state = reduce(
            &state,
            &JobAction::ReceivedJobsByType {
                job_type: JobType::DataRetention,
                jobs: vec![job("a", JobType::DataRetention), job("b", JobType::DataRetention)],
            }
            .into(),
        );
        let state = reduce(
            &state,
            &JobAction::ReceivedJobsByType {
                job_type: JobType::DataRetention,
                jobs: vec![job("c", JobType::DataRetention)],
            }
            .into(),
        );

        assert_eq!(state.jobs.len(), 3);
        assert_eq!(state.jobs_by_type_list[&JobType::DataRetention].len(), 1);
    }

    #[test]
    fn test_received_job_updates_status() {
        let state = Arc::new(JobsState::default());
        let state = reduce(&state, &JobAction::ReceivedJob(job("a", JobType::LdapSync)).into());
        let mut done = job("a", JobType::LdapSync);
        done.status = JobStatus::Success;
        let state = reduce(&state, &JobAction::ReceivedJob(done).into());
        assert_eq!(state.jobs["a"].status, JobStatus::Success);
    }
}
