use crate::Multipart;
use bytes::Bytes;
use futures_util::stream::{Stream, TryStreamExt};
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::ReaderStream;

impl<'a> Multipart<'a> {
    /// Feeds every chunk of `stream` and then [`finish`](Multipart::finish)es.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytes::Bytes;
    /// use formsink::{Multipart, ValueSink};
    /// use futures_util::stream::once;
    /// use std::convert::Infallible;
    ///
    /// # async fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
    ///
    /// let mut field = ValueSink::new();
    /// let mut multipart = Multipart::builder("X-BOUNDARY").unwrap()
    ///     .register("my_text_field", &mut field)
    ///     .build();
    ///
    /// multipart.feed_stream(stream).await.unwrap();
    /// drop(multipart);
    /// assert_eq!(field.text(), "abcd");
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run());
    /// ```
    pub async fn feed_stream<S, O, E>(&mut self, stream: S) -> crate::Result<()>
    where
        S: Stream<Item = Result<O, E>>,
        O: Into<Bytes>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let stream = stream.map_err(|err| crate::Error::StreamReadFailed(err.into()));
        futures_util::pin_mut!(stream);

        while let Some(chunk) = stream.try_next().await? {
            let chunk: Bytes = chunk.into();
            self.feed(&chunk)?;
        }

        self.finish()?;
        Ok(())
    }

    /// Feeds everything `reader` yields and then [`finish`](Multipart::finish)es.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    #[cfg(feature = "tokio-io")]
    #[cfg_attr(nightly, doc(cfg(feature = "tokio-io")))]
    pub async fn feed_reader<R: AsyncRead>(&mut self, reader: R) -> crate::Result<()> {
        self.feed_stream(ReaderStream::new(reader)).await
    }
}
