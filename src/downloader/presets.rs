// Preset builder - per-platform argument presets and fallback chains
//
// The policy table is plain data: one optional platform preset and an
// ordered list of fallbacks per platform, highest expected fidelity first.
// The defaults below are empirically tuned values; a config file may
// replace any platform's entry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::credentials::CredentialReference;
use super::models::{Arg, Preset, PresetChain};
use super::platform::PlatformTag;

const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const IPHONE_UA: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15";

pub const BASE_LABEL: &str = "base";
pub const SIMPLIFIED_LABEL: &str = "simplified";

fn default_true() -> bool {
    true
}

/// Declarative description of one preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetSpec {
    pub label: String,
    #[serde(default)]
    pub args: Vec<Arg>,
    /// Result is printed on stdout instead of written to disk
    #[serde(default)]
    pub capture: bool,
    /// Needs the cookie file; dropped from the chain when none is configured
    #[serde(default)]
    pub credentials: bool,
    /// Append the output template (`-o <dir>/%(title)s.%(ext)s`)
    #[serde(default = "default_true")]
    pub output: bool,
}

impl PresetSpec {
    pub fn new(label: &str, args: Vec<Arg>) -> Self {
        Self {
            label: label.to_string(),
            args,
            capture: false,
            credentials: false,
            output: true,
        }
    }

    fn format(label: &str, format: &str) -> Self {
        Self::new(label, vec![Arg::pair("--format", format)])
    }

    fn merged_mp4(label: &str, format: &str) -> Self {
        Self::new(
            label,
            vec![
                Arg::pair("--format", format),
                Arg::pair("--merge-output-format", "mp4"),
            ],
        )
    }
}

/// Presets for one platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformPolicy {
    /// Overrides applied on top of the base preset
    #[serde(default)]
    pub preset: Option<PresetSpec>,
    /// Tried after the platform preset, in order
    #[serde(default)]
    pub fallbacks: Vec<PresetSpec>,
    /// Longer list used by the exhaustive mode; empty means `fallbacks`
    #[serde(default)]
    pub extended: Vec<PresetSpec>,
}

/// Preset policy table keyed by platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetPolicy {
    platforms: BTreeMap<PlatformTag, PlatformPolicy>,
}

impl PresetPolicy {
    /// A table with no platforms: every URL gets base + simplified fallback
    pub fn empty() -> Self {
        Self {
            platforms: BTreeMap::new(),
        }
    }

    pub fn get(&self, tag: PlatformTag) -> Option<&PlatformPolicy> {
        self.platforms.get(&tag)
    }

    pub fn set(&mut self, tag: PlatformTag, policy: PlatformPolicy) {
        self.platforms.insert(tag, policy);
    }

    /// Replace whole platform entries with the given ones
    pub fn with_overrides(mut self, overrides: &BTreeMap<PlatformTag, PlatformPolicy>) -> Self {
        for (tag, policy) in overrides {
            self.platforms.insert(*tag, policy.clone());
        }
        self
    }
}

impl Default for PresetPolicy {
    fn default() -> Self {
        let simplified = || vec![PresetSpec::format(SIMPLIFIED_LABEL, "best")];
        let mut policy = Self::empty();

        policy.set(
            PlatformTag::Facebook,
            PlatformPolicy {
                preset: Some(PresetSpec::new(
                    "facebook",
                    vec![
                        Arg::pair("--user-agent", DESKTOP_UA),
                        Arg::pair("--referer", "https://www.facebook.com/"),
                        Arg::pair("--format", "best"),
                        Arg::pair("--http-chunk-size", "10M"),
                        Arg::pair("--retries", "10"),
                        Arg::pair("--fragment-retries", "10"),
                        Arg::pair("--extractor-args", "facebook:api_version=v13.0"),
                    ],
                )),
                fallbacks: vec![
                    PresetSpec::format("best quality", "best"),
                    PresetSpec::format("lowest quality", "worst"),
                    PresetSpec::format("HD 720p", "bestvideo[height<=720]+bestaudio/best"),
                    PresetSpec::format(SIMPLIFIED_LABEL, "best"),
                ],
                extended: facebook_extended(),
            },
        );

        policy.set(
            PlatformTag::Instagram,
            PlatformPolicy {
                preset: Some(PresetSpec::new(
                    "instagram",
                    vec![
                        Arg::pair("--format", "best"),
                        Arg::pair("--user-agent", IPHONE_UA),
                    ],
                )),
                fallbacks: simplified(),
                extended: Vec::new(),
            },
        );

        policy.set(
            PlatformTag::Tiktok,
            PlatformPolicy {
                preset: Some(PresetSpec::new(
                    "tiktok",
                    vec![
                        Arg::pair("--format", "best"),
                        Arg::pair(
                            "--extractor-args",
                            "tiktok:api_hostname=api16-normal-c-useast1a.tiktokv.com",
                        ),
                    ],
                )),
                fallbacks: simplified(),
                extended: Vec::new(),
            },
        );

        policy.set(
            PlatformTag::Youtube,
            PlatformPolicy {
                preset: Some(PresetSpec::merged_mp4(
                    "youtube",
                    "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
                )),
                fallbacks: simplified(),
                extended: Vec::new(),
            },
        );

        for tag in [PlatformTag::Twitter, PlatformTag::Generic] {
            policy.set(
                tag,
                PlatformPolicy {
                    preset: None,
                    fallbacks: simplified(),
                    extended: Vec::new(),
                },
            );
        }

        policy
    }
}

/// Every method of the dedicated Facebook flow, in order
fn facebook_extended() -> Vec<PresetSpec> {
    vec![
        PresetSpec::new(
            "basic",
            vec![Arg::pair("--format", "best"), Arg::flag("--no-warnings")],
        ),
        PresetSpec::new(
            "custom headers",
            vec![
                Arg::pair("--user-agent", DESKTOP_UA),
                Arg::pair("--referer", "https://www.facebook.com/"),
                Arg::pair("--add-header", "Accept-Language:es-ES,es;q=0.9,en;q=0.8"),
                Arg::pair(
                    "--add-header",
                    "Accept:text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                ),
                Arg::pair("--format", "best"),
                Arg::flag("--no-check-certificate"),
            ],
        ),
        PresetSpec::new(
            "api configuration",
            vec![
                Arg::pair("--extractor-args", "facebook:api_version=v13.0"),
                Arg::pair("--format", "best"),
                Arg::pair("--http-chunk-size", "10M"),
                Arg::pair("--retries", "15"),
                Arg::pair("--fragment-retries", "15"),
            ],
        ),
        PresetSpec::merged_mp4(
            "format 720p",
            "bestvideo[height<=720]+bestaudio/best[height<=720]",
        ),
        PresetSpec::merged_mp4("format worst", "worst"),
        PresetSpec::merged_mp4("format video+audio", "bestvideo+bestaudio"),
        PresetSpec::merged_mp4("format mp4", "mp4"),
        PresetSpec {
            credentials: true,
            ..PresetSpec::format("session cookies", "best")
        },
        PresetSpec {
            capture: true,
            output: false,
            ..PresetSpec::new(
                "direct url",
                vec![Arg::flag("--get-url"), Arg::pair("--format", "best")],
            )
        },
    ]
}

/// Builds preset chains from explicit configuration
#[derive(Debug, Clone)]
pub struct PresetBuilder {
    output_dir: PathBuf,
    credentials: Option<CredentialReference>,
    subtitle_langs: String,
    policy: PresetPolicy,
}

impl PresetBuilder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            credentials: None,
            subtitle_langs: "es,en".to_string(),
            policy: PresetPolicy::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Option<CredentialReference>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_subtitle_langs(mut self, langs: impl Into<String>) -> Self {
        self.subtitle_langs = langs.into();
        self
    }

    pub fn with_policy(mut self, policy: PresetPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn credentials(&self) -> Option<&CredentialReference> {
        self.credentials.as_ref()
    }

    pub fn output_template(&self) -> String {
        self.output_dir
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned()
    }

    fn credential_args(&self) -> Option<Vec<Arg>> {
        self.credentials
            .as_ref()
            .filter(|c| c.is_available())
            .map(|c| vec![Arg::pair("--cookies", c.path().to_string_lossy())])
    }

    /// Preset shared by all platforms, always first in a chain
    pub fn base_preset(&self) -> Preset {
        let mut args = vec![
            Arg::flag("--no-warnings"),
            Arg::flag("--no-check-certificate"),
            Arg::flag("--prefer-free-formats"),
            Arg::flag("--add-metadata"),
            Arg::flag("--embed-thumbnail"),
            Arg::flag("--embed-subs"),
            Arg::pair("--sub-langs", self.subtitle_langs.clone()),
            Arg::pair("--convert-subs", "srt"),
            Arg::pair("-o", self.output_template()),
        ];
        args.extend(self.credential_args().unwrap_or_default());
        Preset::new(BASE_LABEL, args)
    }

    /// Chain for `tag`: base, platform preset (if any), then fallbacks
    pub fn build(&self, tag: PlatformTag) -> PresetChain {
        self.assemble(tag, false)
    }

    /// Like [`build`](Self::build) but with the platform's extended fallbacks
    pub fn build_extended(&self, tag: PlatformTag) -> PresetChain {
        self.assemble(tag, true)
    }

    fn assemble(&self, tag: PlatformTag, extended: bool) -> PresetChain {
        let base = self.base_preset();
        let mut chain = PresetChain::new(base.clone());

        let Some(policy) = self.policy.get(tag) else {
            let simplified = PresetSpec::format(SIMPLIFIED_LABEL, "best");
            if let Some(preset) = self.materialize(&simplified) {
                chain.push(preset);
            }
            return chain;
        };

        if let Some(spec) = &policy.preset {
            let mut overrides = spec.args.clone();
            if spec.credentials {
                overrides.extend(self.credential_args().unwrap_or_default());
            }
            let mut preset = base.with_overrides(spec.label.clone(), &overrides);
            if spec.capture {
                preset = preset.capturing();
            }
            chain.push(preset);
        }

        let fallbacks = if extended && !policy.extended.is_empty() {
            &policy.extended
        } else {
            &policy.fallbacks
        };
        for spec in fallbacks {
            if let Some(preset) = self.materialize(spec) {
                chain.push(preset);
            }
        }

        chain
    }

    /// Standalone preset from a spec; None when it needs missing credentials
    fn materialize(&self, spec: &PresetSpec) -> Option<Preset> {
        let mut args = spec.args.clone();
        if spec.credentials {
            args.extend(self.credential_args()?);
        }
        if spec.output {
            args.push(Arg::pair("-o", self.output_template()));
        }
        let preset = Preset::new(spec.label.clone(), args);
        Some(if spec.capture { preset.capturing() } else { preset })
    }
}
