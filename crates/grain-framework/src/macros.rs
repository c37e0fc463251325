//! # Kind Declarations
//!
//! [`grain_kind!`] turns one ordered method list into everything both sides of the
//! wire need, so the caller's and the dispatcher's view of a kind can't drift apart.

/// Declares a grain kind.
///
/// ```rust
/// use grain_framework::{grain_kind, Grain};
/// use async_trait::async_trait;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)] pub struct PingRequest { pub seq: u32 }
/// #[derive(Debug, Serialize, Deserialize)] pub struct PingResponse { pub seq: u32 }
///
/// grain_kind! {
///     /// Echoes sequence numbers.
///     pub trait Pinger {
///         0 => async fn ping(PingRequest) -> PingResponse;
///     }
/// }
///
/// #[derive(Debug, thiserror::Error)] #[error("never")] pub struct Never;
///
/// struct Echo;
///
/// #[async_trait]
/// impl Grain for Echo { type Error = Never; }
///
/// #[async_trait]
/// impl Pinger for Echo {
///     async fn ping(&mut self, request: PingRequest) -> Result<PingResponse, Never> {
///         Ok(PingResponse { seq: request.seq })
///     }
/// }
///
/// // Generated: PingerKind, Ping (method marker), PingerClient.
/// let registration = PingerKind::registration::<Echo, _>(|_ctx| Ok(Echo)).unwrap();
/// assert_eq!(registration.name(), "Pinger");
/// ```
///
/// For `trait Pinger` the macro generates:
///
/// - `trait Pinger: Grain` with one `async fn` handler per method;
/// - `PingerKind`, the [`GrainKind`](crate::GrainKind) marker, with `registry::<G>()`
///   and `registration(factory)`;
/// - one method marker per method, named after it in CamelCase (`ping` → `Ping`),
///   implementing [`GrainMethod`](crate::GrainMethod) and [`Invoke`](crate::Invoke);
/// - `PingerClient`, the typed client, with `ping(&request, deadline)`.
///
/// All of these land in the scope the macro is invoked in. The method markers take
/// the CamelCase method names, so a request type of the same name (`fn forward(Forward)`)
/// does not compile; name the type after the payload (`Relay`, `PingRequest`) or
/// declare the kind in its own module.
///
/// Indices must start at zero and follow declaration order; the generated
/// `registry()` returns [`RegistryError::OutOfOrder`](crate::RegistryError) otherwise.
#[macro_export]
macro_rules! grain_kind {
    (
        $(#[$kind_meta:meta])*
        $vis:vis trait $kind:ident {
            $(
                $(#[$method_meta:meta])*
                $index:literal => async fn $method:ident($request:ty) -> $response:ty;
            )+
        }
    ) => {
        $crate::__private::paste! {
            $(#[$kind_meta])*
            #[$crate::__private::async_trait]
            $vis trait $kind: $crate::Grain {
                $(
                    $(#[$method_meta])*
                    async fn $method(
                        &mut self,
                        request: $request,
                    ) -> ::core::result::Result<$response, <Self as $crate::Grain>::Error>;
                )+
            }

            #[doc = "Kind marker for [`" $kind "`] grains."]
            #[derive(Debug, Clone, Copy, Default)]
            $vis struct [<$kind Kind>];

            impl $crate::GrainKind for [<$kind Kind>] {
                const NAME: &'static str = stringify!($kind);
            }

            impl [<$kind Kind>] {
                /// Builds the method table for grain type `G`.
                pub fn registry<G: $kind>()
                    -> ::core::result::Result<$crate::MethodRegistry<G>, $crate::RegistryError>
                {
                    ::core::result::Result::Ok(
                        $crate::MethodRegistry::<G>::builder::<Self>()
                            $( .method::<[<$method:camel>]>()? )+
                            .build()
                    )
                }

                /// Bundles the method table with a factory, ready for
                /// [`ClusterConfig::with_kind`]($crate::ClusterConfig::with_kind).
                pub fn registration<G, F>(factory: F)
                    -> ::core::result::Result<$crate::KindRegistration, $crate::RegistryError>
                where
                    G: $kind,
                    F: Fn(&$crate::GrainContext) -> ::core::result::Result<G, <G as $crate::Grain>::Error>
                        + Send
                        + Sync
                        + 'static,
                {
                    ::core::result::Result::Ok($crate::KindRegistration::new(
                        Self::registry::<G>()?,
                        factory,
                    ))
                }
            }

            $(
                #[doc = "Method marker for `" $kind "::" $method "`."]
                #[derive(Debug, Clone, Copy, Default)]
                $vis struct [<$method:camel>];

                impl $crate::GrainMethod for [<$method:camel>] {
                    type Kind = [<$kind Kind>];
                    type Request = $request;
                    type Response = $response;

                    const INDEX: $crate::MethodIndex = $crate::MethodIndex::new($index);
                    const NAME: &'static str = stringify!($method);
                }

                impl<G: $kind> $crate::Invoke<G> for [<$method:camel>] {
                    fn invoke(
                        grain: &mut G,
                        request: $request,
                    ) -> $crate::__private::BoxFuture<'_, ::core::result::Result<$response, <G as $crate::Grain>::Error>> {
                        <G as $kind>::$method(grain, request)
                    }
                }
            )+

            #[doc = "Typed client for [`" $kind "`] grains."]
            #[derive(Clone)]
            $vis struct [<$kind Client>] {
                inner: $crate::GrainClient<[<$kind Kind>]>,
            }

            impl $crate::KindClient for [<$kind Client>] {
                type Kind = [<$kind Kind>];

                fn from_client(inner: $crate::GrainClient<[<$kind Kind>]>) -> Self {
                    Self { inner }
                }

                fn inner(&self) -> &$crate::GrainClient<[<$kind Kind>]> {
                    &self.inner
                }
            }

            impl [<$kind Client>] {
                $(
                    $(#[$method_meta])*
                    pub async fn $method(
                        &self,
                        request: &$request,
                        deadline: ::std::time::Duration,
                    ) -> ::core::result::Result<$response, $crate::GrainCallError> {
                        self.inner.call::<[<$method:camel>]>(request, deadline).await
                    }
                )+
            }

            impl ::std::fmt::Debug for [<$kind Client>] {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.debug_struct(stringify!([<$kind Client>]))
                        .field("identity", self.inner.identity())
                        .finish()
                }
            }
        }
    };
}
