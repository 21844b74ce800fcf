use fotoai_pipeline::{Collaborators, EnhancementPipeline, PipelineOptions, ProcessRequest};
use fotoai_test_support::Harness;

pub fn collaborators(h: &Harness) -> Collaborators {
    Collaborators {
        identity: h.identity.clone(),
        credits: h.credits.clone(),
        settings: h.settings.clone(),
        results: h.results.clone(),
        storage: h.storage.clone(),
        enhancer: h.enhancer.clone(),
        remover: h.remover.clone(),
        generator: h.generator.clone(),
        fetcher: h.fetcher.clone(),
    }
}

pub fn pipeline(h: &Harness, options: PipelineOptions) -> EnhancementPipeline {
    EnhancementPipeline::new(collaborators(h), options)
}

pub fn request(image_path: &str, processing_type: &str, background: Option<&str>) -> ProcessRequest {
    ProcessRequest {
        image_path: Some(image_path.to_string()),
        processing_type: Some(processing_type.to_string()),
        project_id: None,
        background_option: background.map(str::to_string),
    }
}
