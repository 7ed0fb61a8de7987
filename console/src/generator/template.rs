use anyhow::Context;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rulcore::Subsystem;

/// Settings for a batch upload template.
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    pub subsystem: Subsystem,
    pub rows: usize,
    pub seed: u64,
    /// Relative spread applied around each field's default value.
    pub jitter: f64,
}

impl TemplateConfig {
    pub fn new(subsystem: Subsystem, rows: usize, seed: u64) -> Self {
        Self {
            subsystem,
            rows,
            seed,
            jitter: 0.05,
        }
    }
}

fn jittered(rng: &mut StdRng, default: f64, jitter: f64) -> f64 {
    if jitter <= 0.0 {
        return default;
    }
    let scale = if default == 0.0 { 1.0 } else { default.abs() };
    default + rng.gen_range(-jitter..jitter) * scale
}

/// CSV text with the subsystem's required header and `rows` synthetic lines
/// around the console's default form values. The same seed gives the same file.
pub fn build_template(config: &TemplateConfig) -> anyhow::Result<String> {
    let schema = config.subsystem.schema();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(schema.fields.iter().map(|spec| spec.name))
        .context("writing template header")?;
    for _ in 0..config.rows {
        let row: Vec<String> = schema
            .fields
            .iter()
            .map(|spec| format!("{:.3}", jittered(&mut rng, spec.default, config.jitter)))
            .collect();
        writer.write_record(&row).context("writing template row")?;
    }

    let bytes = writer.into_inner().context("flushing template")?;
    String::from_utf8(bytes).context("template is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulcore::ingest::parse_str;
    use rulcore::schema::validate_headers;

    #[test]
    fn template_passes_parser_and_validator() {
        let config = TemplateConfig::new(Subsystem::Hydraulics, 4, 7);
        let text = build_template(&config).unwrap();
        let parsed = parse_str(&text).unwrap();
        assert_eq!(parsed.len(), 4);
        assert!(validate_headers(Subsystem::Hydraulics, &parsed.headers).is_ok());
    }

    #[test]
    fn same_seed_repeats_rows() {
        let config = TemplateConfig::new(Subsystem::Engine, 3, 312);
        assert_eq!(build_template(&config).unwrap(), build_template(&config).unwrap());
    }

    #[test]
    fn zero_jitter_writes_defaults() {
        let config = TemplateConfig {
            jitter: 0.0,
            ..TemplateConfig::new(Subsystem::LandingGear, 1, 0)
        };
        let text = build_template(&config).unwrap();
        assert_eq!(
            text,
            "load_during_landing,tire_pressure,speed_during_landing\n75.000,32.500,160.000\n"
        );
    }
}
