use crate::{
    Error,
    Result,
    oracle::RandomnessOracle,
    participant::Participant,
};

/// Draws `count` distinct items one oracle pick at a time. `count` is
/// clamped to the number of items.
pub async fn draw_items<O: RandomnessOracle>(
    oracle: &mut O,
    items: &[String],
    count: usize,
) -> Result<Vec<String>> {
    if items.is_empty() {
        return Err(Error::EmptyList);
    }
    let mut remaining = items.to_vec();
    let count = count.min(remaining.len());
    let mut drawn = Vec::with_capacity(count);
    while drawn.len() < count {
        let picked = oracle.random_pick(&remaining).await?;
        let position = remaining
            .iter()
            .position(|item| *item == picked)
            .ok_or_else(|| {
                Error::Upstream(format!("oracle picked '{picked}' which is not in the list"))
            })?;
        drawn.push(remaining.remove(position));
    }
    Ok(drawn)
}

/// Selects up to `k` winners from the pool without replacement, in draw order.
pub async fn select_winners<O: RandomnessOracle>(
    oracle: &mut O,
    pool: &[Participant],
    k: usize,
) -> Result<Vec<Participant>> {
    if pool.is_empty() {
        return Err(Error::EmptyPool);
    }
    if k == 0 {
        return Ok(Vec::new());
    }
    if let [only] = pool {
        return Ok(vec![only.clone()]);
    }
    let ids: Vec<String> = pool.iter().map(|p| p.id.clone()).collect();
    let drawn = draw_items(oracle, &ids, k).await?;
    let winners: Vec<Participant> = drawn
        .iter()
        .filter_map(|id| pool.iter().find(|p| p.id == *id).cloned())
        .collect();
    tracing::info!("selected {} winners from {} participants", winners.len(), pool.len());
    Ok(winners)
}
