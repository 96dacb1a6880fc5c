use crate::core::ad::AdCreator;
use crate::core::adset::AdSetDuplicator;
use crate::core::classifier;
use crate::core::creative::{CreativeBuilder, CreativeVariant};
use crate::core::media::MediaResolver;
use crate::core::template::TemplateResolver;
use crate::domain::model::{
    AdGroup, AdGroupInput, AdResult, BatchCreateRequest, BatchCreateResult, TemplateContext,
};
use crate::domain::ports::{AdsApi, BatchObserver, BatchState, PipelineStep, StepEvent, StepOutcome};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Final state of a batch: the aggregated result plus every group with its
/// last status.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub result: BatchCreateResult,
    pub groups: Vec<AdGroup>,
}

/// Dry-run view of one ad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAd {
    pub index: usize,
    pub ad_name: String,
    pub group_key: String,
    pub media_count: usize,
    pub variant: Option<CreativeVariant>,
}

/// Shared values every group needs once the ad set exists.
struct GroupContext<'a> {
    access_token: &'a str,
    template: &'a TemplateContext,
    ad_set_id: &'a str,
    scheduled_time: Option<DateTime<Utc>>,
}

/// Runs a batch: template and ad set once, then each group in order. Group
/// failures are recorded and never stop the remaining groups.
pub struct BatchOrchestrator<A: AdsApi, O: BatchObserver> {
    api: A,
    observer: O,
}

impl<A: AdsApi, O: BatchObserver> BatchOrchestrator<A, O> {
    pub fn new(api: A, observer: O) -> Self {
        Self { api, observer }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub async fn run(&self, request: BatchCreateRequest) -> Result<BatchCreateResult> {
        Ok(self.run_with_groups(request).await?.result)
    }

    pub async fn run_with_groups(&self, request: BatchCreateRequest) -> Result<BatchOutcome> {
        let BatchCreateRequest {
            access_token,
            template_ad_id,
            new_ad_set_name,
            scheduled_time,
            ads,
        } = request;
        let groups = groups_from_inputs(ads);

        tracing::info!(
            "🚀 Starting batch '{}' from template ad {} ({} ads)",
            new_ad_set_name,
            template_ad_id,
            groups.len()
        );

        self.observer.on_state(BatchState::ResolvingTemplate);
        let template = TemplateResolver::new(&self.api)
            .resolve(&access_token, &template_ad_id)
            .await;
        self.report(None, PipelineStep::ResolveTemplate, &template, |t| {
            Some(t.context.source_ad_set_id.clone())
        });
        let template = template?;

        self.observer.on_state(BatchState::DuplicatingAdSet);
        let ad_set = AdSetDuplicator::new(&self.api)
            .duplicate(
                &access_token,
                &template.context.account_id,
                &template.ad_set.campaign_id,
                &template.ad_set,
                &new_ad_set_name,
            )
            .await;
        self.report(None, PipelineStep::DuplicateAdSet, &ad_set, |s| Some(s.id.clone()));
        let ad_set = ad_set?;

        self.observer.on_state(BatchState::ProcessingGroups);
        let context = GroupContext {
            access_token: &access_token,
            template: &template.context,
            ad_set_id: &ad_set.id,
            scheduled_time,
        };

        let mut settled = Vec::with_capacity(groups.len());
        for (index, group) in groups.into_iter().enumerate() {
            settled.push(self.settle_group(index, group, &context).await);
        }
        let (results, processed): (Vec<AdResult>, Vec<AdGroup>) = settled.into_iter().unzip();

        self.observer.on_state(BatchState::Done);
        let result = BatchCreateResult {
            ad_set_id: ad_set.id,
            ad_set_name: ad_set.name,
            results,
        };
        tracing::info!(
            "🏁 Batch finished: {} succeeded, {} failed (ad set {})",
            result.succeeded_count(),
            result.failed_count(),
            result.ad_set_id
        );

        Ok(BatchOutcome {
            result,
            groups: processed,
        })
    }

    /// Runs one group to its final status. Errors stay inside the group.
    async fn settle_group(
        &self,
        index: usize,
        mut group: AdGroup,
        context: &GroupContext<'_>,
    ) -> (AdResult, AdGroup) {
        group.mark_in_progress();
        let result = match self.process_group(index, &group, context).await {
            Ok(ad_id) => {
                tracing::info!("✅ [{}] '{}' created as ad {}", index, group.ad_name, ad_id);
                group.mark_success();
                AdResult::succeeded(group.ad_name.clone(), ad_id)
            }
            Err(e) => {
                let message = e.upstream_message();
                tracing::error!("❌ [{}] '{}' failed: {}", index, group.ad_name, e);
                group.mark_failed(message.clone());
                AdResult::failed(group.ad_name.clone(), message)
            }
        };
        (result, group)
    }

    /// Media → creative → ad for one group.
    async fn process_group(&self, index: usize, group: &AdGroup, context: &GroupContext<'_>) -> Result<String> {
        let account_id = context.template.account_id.as_str();

        let media = MediaResolver::new(&self.api, context.access_token, account_id)
            .resolve_group(group)
            .await;
        self.report(Some(index), PipelineStep::ResolveMedia, &media, |_| None);
        let media = media?;

        let creative = CreativeBuilder::new(
            &self.api,
            context.access_token,
            account_id,
            &context.template.page_id,
        )
        .create(&group.ad_name, &media, &group.copy)
        .await;
        self.report(Some(index), PipelineStep::BuildCreative, &creative, |c| Some(c.id.clone()));
        let creative = creative?;

        let ad_id = AdCreator::new(&self.api, context.access_token, account_id)
            .create(
                context.ad_set_id,
                &creative.id,
                &group.ad_name,
                context.scheduled_time,
            )
            .await;
        self.report(Some(index), PipelineStep::CreateAd, &ad_id, |id| Some(id.clone()));
        ad_id
    }

    fn report<T>(
        &self,
        group_index: Option<usize>,
        step: PipelineStep,
        result: &Result<T>,
        id: impl FnOnce(&T) -> Option<String>,
    ) {
        let outcome = match result {
            Ok(value) => StepOutcome::Succeeded(id(value)),
            Err(e) => StepOutcome::Failed(e.upstream_message()),
        };
        self.observer.on_step(&StepEvent {
            group_index,
            step,
            outcome,
        });
    }
}

/// What a batch would do, from the declared media only. Makes no calls.
pub fn plan(request: &BatchCreateRequest) -> Vec<PlannedAd> {
    request
        .ads
        .iter()
        .enumerate()
        .map(|(index, ad)| PlannedAd {
            index,
            ad_name: ad.ad_name.clone(),
            group_key: group_key_for(ad),
            media_count: ad.media.len(),
            variant: CreativeVariant::for_kinds(
                ad.media
                    .iter()
                    .filter(|m| m.resolved_ref.is_some() || m.payload.is_some())
                    .map(|m| m.kind),
            ),
        })
        .collect()
}

fn group_key_for(input: &AdGroupInput) -> String {
    input
        .media
        .first()
        .map(|media| classifier::group_key(&media.filename))
        .unwrap_or_else(|| input.ad_name.clone())
}

fn groups_from_inputs(inputs: Vec<AdGroupInput>) -> Vec<AdGroup> {
    inputs
        .into_iter()
        .map(|input| {
            let key = group_key_for(&input);
            AdGroup::from_input(key, input)
        })
        .collect()
}
