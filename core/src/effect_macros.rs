//! Declarative macros for ergonomic effect construction

/// Create an [`Effect::future`](crate::effect::Effect::future) from an async block
///
/// # Example
///
/// ```rust,ignore
/// use composable_store_core::async_effect;
///
/// async_effect! {
///     let results = env.search(&query).await;
///     SearchAction::Response(results)
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::future(async move { $($body)* })
    };
}

/// Create an effect that emits an action after a delay
///
/// # Example
///
/// ```rust,ignore
/// use composable_store_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(30),
///     action: TimerAction::Expired,
///     scheduler: env.scheduler.clone()
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr,
        scheduler: $scheduler:expr
    ) => {
        $crate::effect::Effect::just($action).delay($duration, $scheduler)
    };
}
