use crate::error::InternalError;
use crate::router::RouteTable;
use crate::sink::{NullSink, PartSink};
use crate::PartHeaders;

/// The part currently streamed to a sink.
#[derive(Debug)]
pub(crate) struct PartContext {
    pub(crate) index: usize,
    pub(crate) route: Option<usize>,
    pub(crate) headers: PartHeaders,
    pub(crate) emitted: u64,
}

/// Drives the begin/data/end calls of the sink a part is routed to.
#[derive(Debug)]
pub(crate) struct Dispatcher<'a> {
    routes: RouteTable<'a>,
    discard: NullSink,
    part: Option<PartContext>,
    next_index: usize,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(routes: RouteTable<'a>) -> Dispatcher<'a> {
        Dispatcher {
            routes,
            discard: NullSink,
            part: None,
            next_index: 0,
        }
    }

    pub(crate) fn current(&self) -> Option<&PartContext> {
        self.part.as_ref()
    }

    /// Number of parts that have begun so far.
    pub(crate) fn parts_seen(&self) -> usize {
        self.next_index
    }

    fn sink(&mut self, route: Option<usize>) -> &mut (dyn PartSink + 'a) {
        let routed = match route {
            Some(idx) => self.routes.sink_mut(idx),
            None => None,
        };

        match routed {
            Some(sink) => sink,
            None => &mut self.discard,
        }
    }

    pub(crate) fn begin(&mut self, headers: PartHeaders) {
        let route = self.routes.route(headers.name());
        let index = self.next_index;
        self.next_index += 1;

        match route.and_then(|idx| self.routes.target_name(idx)) {
            Some(target) => debug!("part #{} {:?} routed to target {:?}", index, headers.name(), target),
            None => debug!("part #{} {:?} matches no target, discarding", index, headers.name()),
        }

        self.sink(route).on_part_begin(&headers);
        self.part = Some(PartContext {
            index,
            route,
            headers,
            emitted: 0,
        });
    }

    pub(crate) fn data(&mut self, bytes: &[u8]) -> Result<(), InternalError> {
        let part = self.part.as_mut().ok_or(InternalError::DataOutsidePart)?;
        part.emitted += bytes.len() as u64;
        let route = part.route;

        trace!("forwarding {} bytes", bytes.len());
        self.sink(route).on_part_data(bytes);

        Ok(())
    }

    pub(crate) fn end(&mut self) -> Result<(), InternalError> {
        let part = self.part.take().ok_or(InternalError::DataOutsidePart)?;
        debug!(
            "part #{} {:?} ended after {} bytes",
            part.index,
            part.headers.name(),
            part.emitted
        );

        self.sink(part.route).on_part_end();

        Ok(())
    }
}
