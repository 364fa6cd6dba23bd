use crate::assets::{Asset, AssetVersion, FileAssetMap};
use crate::cdn::CdnClients;
use indexmap::{IndexMap, IndexSet};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

/// Outcome of comparing the versions in use against the latest published ones
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Stale assets, in first-seen order
    pub assets_to_update: IndexSet<Asset>,
    /// Latest version of every asset that could be resolved
    pub latest_versions: IndexMap<Asset, String>,
    /// Distinct versions referenced per asset, across all files
    pub observed_versions: IndexMap<Asset, IndexSet<String>>,
}

impl Reconciliation {
    /// Stale assets paired with the version they should move to
    pub fn targets(&self) -> Vec<AssetVersion> {
        self.assets_to_update
            .iter()
            .filter_map(|asset| {
                self.latest_versions
                    .get(asset)
                    .map(|latest| AssetVersion::new(asset.clone(), latest.clone()))
            })
            .collect()
    }

    pub fn stale_versions(&self, asset: &Asset) -> Vec<&str> {
        let latest = self.latest_versions.get(asset);
        self.observed_versions
            .get(asset)
            .map(|versions| {
                versions
                    .iter()
                    .filter(|v| Some(*v) != latest)
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// VersionReconciler resolves the latest version of every referenced package
pub struct VersionReconciler<'a> {
    clients: &'a CdnClients,
}

impl<'a> VersionReconciler<'a> {
    pub fn new(clients: &'a CdnClients) -> Self {
        Self { clients }
    }

    pub fn reconcile(&self, file_assets: &FileAssetMap) -> Reconciliation {
        let observed_versions = Self::collect_versions(file_assets);
        let mut reconciliation = Reconciliation {
            observed_versions,
            ..Reconciliation::default()
        };

        let pb = ProgressBar::new(reconciliation.observed_versions.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  [{bar:40}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        for (asset, versions) in &reconciliation.observed_versions {
            pb.set_message(format!("Checking {}", asset.name));

            let client = self.clients.for_provider(asset.cdn);
            match client.latest_version(&asset.name) {
                Ok(Some(latest)) => {
                    debug!(asset = %asset, latest = %latest, "resolved latest version");
                    if versions.iter().any(|v| *v != latest) {
                        reconciliation.assets_to_update.insert(asset.clone());
                    }
                    reconciliation.latest_versions.insert(asset.clone(), latest);
                }
                Ok(None) => {
                    warn!(asset = %asset, "no latest version published, skipping");
                }
                Err(e) => {
                    warn!(asset = %asset, error = %e, "failed to resolve latest version, skipping");
                }
            }

            pb.inc(1);
        }
        pb.finish_and_clear();

        reconciliation
    }

    fn collect_versions(file_assets: &FileAssetMap) -> IndexMap<Asset, IndexSet<String>> {
        let mut versions: IndexMap<Asset, IndexSet<String>> = IndexMap::new();

        for item in file_assets.values().flatten() {
            versions
                .entry(item.asset().clone())
                .or_default()
                .insert(item.version().to_string());
        }

        versions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::extractor::parse_asset_url;
    use crate::assets::CdnProvider;
    use crate::cdn::testing::{clients, FakeCdn};
    use std::path::PathBuf;

    fn file_assets(files: &[(&str, &[&str])]) -> FileAssetMap {
        files
            .iter()
            .map(|(path, urls)| {
                let items = urls
                    .iter()
                    .map(|url| parse_asset_url(url, None).unwrap())
                    .collect();
                (PathBuf::from(path), items)
            })
            .collect()
    }

    #[test]
    fn one_stale_entry_for_several_versions() {
        let map = file_assets(&[
            ("a.html", &["https://cdnjs.cloudflare.com/ajax/libs/foo/1.0.0/foo.js"]),
            ("b.html", &["https://cdnjs.cloudflare.com/ajax/libs/foo/2.0.0/foo.js"]),
        ]);
        let clients = clients(FakeCdn::default().with_latest("foo", "2.0.0"), FakeCdn::default());

        let result = VersionReconciler::new(&clients).reconcile(&map);

        assert_eq!(result.assets_to_update.len(), 1);
        let targets = result.targets();
        assert_eq!(targets, vec![AssetVersion::new(Asset::new(CdnProvider::Cdnjs, "foo"), "2.0.0")]);
        assert_eq!(result.stale_versions(&targets[0].asset), vec!["1.0.0"]);
    }

    #[test]
    fn current_assets_are_not_stale() {
        let map = file_assets(&[(
            "a.html",
            &["https://cdn.jsdelivr.net/npm/vue@3.4.0/dist/vue.js"],
        )]);
        let clients = clients(FakeCdn::default(), FakeCdn::default().with_latest("vue", "3.4.0"));

        let result = VersionReconciler::new(&clients).reconcile(&map);

        assert!(result.assets_to_update.is_empty());
        assert_eq!(result.latest_versions.len(), 1);
    }

    #[test]
    fn same_name_on_different_cdns_are_distinct() {
        let map = file_assets(&[(
            "a.html",
            &[
                "https://cdnjs.cloudflare.com/ajax/libs/vue/3.0.0/vue.js",
                "https://cdn.jsdelivr.net/npm/vue@3.4.0/dist/vue.js",
            ],
        )]);
        let clients = clients(
            FakeCdn::default().with_latest("vue", "3.4.0"),
            FakeCdn::default().with_latest("vue", "3.4.0"),
        );

        let result = VersionReconciler::new(&clients).reconcile(&map);

        let stale: Vec<_> = result.assets_to_update.iter().collect();
        assert_eq!(stale, vec![&Asset::new(CdnProvider::Cdnjs, "vue")]);
    }

    #[test]
    fn failed_lookups_are_excluded_and_order_is_first_seen() {
        let map = file_assets(&[
            (
                "a.html",
                &[
                    "https://cdnjs.cloudflare.com/ajax/libs/zeta/1.0.0/zeta.js",
                    "https://cdnjs.cloudflare.com/ajax/libs/broken/1.0.0/broken.js",
                ],
            ),
            (
                "b.html",
                &[
                    "https://cdnjs.cloudflare.com/ajax/libs/alpha/1.0.0/alpha.js",
                    "https://cdnjs.cloudflare.com/ajax/libs/unknown/1.0.0/unknown.js",
                ],
            ),
        ]);
        let clients = clients(
            FakeCdn::default()
                .with_latest("zeta", "2.0.0")
                .with_latest("alpha", "2.0.0")
                .failing("broken"),
            FakeCdn::default(),
        );

        let result = VersionReconciler::new(&clients).reconcile(&map);

        let names: Vec<_> = result.targets().into_iter().map(|t| t.asset.name).collect();
        assert_eq!(names, vec!["zeta".to_string(), "alpha".to_string()]);
    }
}
