use super::*;

/// Picks `k` distinct points uniformly at random.
pub struct RandomInit;

impl<T: Float> Initializer<T> for RandomInit {
    fn initialize(
        &self,
        clustering: &mut Clustering<'_, T>,
        selector: &mut UniformSelector,
        _executor: &Executor,
    ) -> Result<()> {
        let num_medoids = clustering.num_clusters();
        let num_elements = clustering.data().rows();

        for idx in selector.select(num_medoids, num_elements)? {
            clustering.add_medoid(idx)?;
        }

        Ok(())
    }
}
