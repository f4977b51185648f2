use async_channel::{Receiver, RecvError, SendError, Sender, TryRecvError, TrySendError, bounded, unbounded};

/// Multiple producers multiple consumers channel
#[derive(Clone, Debug)]
pub struct Channel<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T> Channel<T> {
    pub fn unbounded() -> Channel<T> {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn bounded(capacity: usize) -> Channel<T> {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// A bounded channel of capacity 1, meant to carry a single signal
    pub fn oneshot() -> Channel<T> {
        Self::bounded(1)
    }

    pub fn sender(&self) -> Sender<T> {
        self.sender.clone()
    }

    pub fn receiver(&self) -> Receiver<T> {
        self.receiver.clone()
    }

    pub fn close(&self) -> bool {
        self.receiver.close()
    }

    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }

    pub async fn recv(&self) -> Result<T, RecvError> {
        self.receiver.recv().await
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.receiver.try_recv()
    }

    pub async fn send(&self, msg: T) -> Result<(), SendError<T>> {
        self.sender.send(msg).await
    }

    pub fn try_send(&self, msg: T) -> Result<(), TrySendError<T>> {
        self.sender.try_send(msg)
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Default for a [`Channel<T>`] is unbounded
impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_closing() {
        let channel: Channel<u64> = Channel::unbounded();
        let sender = channel.sender();
        channel.try_send(42).unwrap();
        assert_eq!(channel.recv().await.unwrap(), 42);

        assert!(channel.close());
        assert!(channel.is_closed());
        assert!(sender.is_closed());
        assert!(sender.try_send(43).is_err());
    }

    #[tokio::test]
    async fn test_oneshot_capacity() {
        let channel: Channel<()> = Channel::oneshot();
        channel.try_send(()).unwrap();
        assert!(channel.try_send(()).is_err());
    }
}
