use huddle_shared::{Job, JobType};
use huddle_store::{JobAction, RequestOp, Store};

use crate::actions::bind_request;
use crate::client::Client;
use crate::error::Result;

pub async fn create_job(client: &Client, store: &Store, job_type: JobType, data: serde_json::Value) -> Result<Job> {
    bind_request(
        client,
        store,
        RequestOp::CreateJob,
        client.create_job(job_type, &data),
        |job| vec![JobAction::ReceivedJob(job.clone()).into()],
    )
    .await
}

pub async fn get_job(client: &Client, store: &Store, id: &str) -> Result<Job> {
    bind_request(client, store, RequestOp::GetJob, client.get_job(id), |job| {
        vec![JobAction::ReceivedJob(job.clone()).into()]
    })
    .await
}

pub async fn get_jobs(client: &Client, store: &Store, page: u32, per_page: u32) -> Result<Vec<Job>> {
    bind_request(
        client,
        store,
        RequestOp::GetJobs,
        client.get_jobs(page, per_page),
        |jobs| vec![JobAction::ReceivedJobs(jobs.clone()).into()],
    )
    .await
}

pub async fn get_jobs_by_type(
    client: &Client,
    store: &Store,
    job_type: JobType,
    page: u32,
    per_page: u32,
) -> Result<Vec<Job>> {
    bind_request(
        client,
        store,
        RequestOp::GetJobsByType,
        client.get_jobs_by_type(job_type, page, per_page),
        |jobs| {
            vec![JobAction::ReceivedJobsByType {
                job_type,
                jobs: jobs.clone(),
            }
            .into()]
        },
    )
    .await
}

/// Ask the server to stop a job. Its status changes on the next fetch.
pub async fn cancel_job(client: &Client, store: &Store, id: &str) -> Result<()> {
    bind_request(client, store, RequestOp::CancelJob, client.cancel_job(id), |_| Vec::new()).await
}
