use crate::{Architecture, InstanceId};

/// Appends `text` to the label of every listed instance and returns `name`.
///
/// Meant to be called from a processor: each processor labels the same instances with a
/// different aspect (technology, owning team, ...). Start `text` with `<BR/>` to put it on its
/// own line.
pub fn details<'n, 't, L>(
    arch: &mut Architecture,
    name: &'n str,
    labels: impl IntoIterator<Item = (L, &'t str)>,
) -> &'n str
where
    L: AsRef<[InstanceId]>,
{
    for (targets, text) in labels {
        for &instance in targets.as_ref() {
            arch.instance_mut(instance).details(text);
        }
    }
    name
}
